// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Ownership discipline between a caller's frame and the processor.
//!
//! The caller's buffer is borrowed through a [`FrameHandle`], pinned for the
//! duration of one call and released exactly once on every exit path by the
//! [`PinnedFrame`] guard. Release never writes back: the input is read-only.
//! The result is a fresh [`FrameBuffer`] whose ownership moves to the
//! caller. Nothing is retained between calls.

use crate::{
    error::{FrameError, Result},
    frame::{FrameBuffer, FrameView},
    strategy::{Backend, CannyParams, EdgeStrategy, Operation, StrategyKind},
};
use std::time::Instant;
use tracing::{debug, warn};

/// A caller-owned frame buffer that must be pinned before reading.
pub trait FrameHandle {
    /// Makes the underlying storage readable through [`FrameHandle::bytes`].
    ///
    /// On failure the implementation must leave nothing pinned.
    fn pin(&mut self) -> Result<()>;

    /// The pinned bytes. Only called between a successful `pin` and
    /// `release`.
    fn bytes(&self) -> &[u8];

    /// Unpins the storage, discarding any view of it without write-back.
    fn release(&mut self);
}

/// Frame handle over an ordinary Rust slice. Pinning cannot fail.
pub struct SliceFrame<'a>(pub &'a [u8]);

impl FrameHandle for SliceFrame<'_> {
    fn pin(&mut self) -> Result<()> {
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        self.0
    }

    fn release(&mut self) {}
}

/// Scoped pin of a [`FrameHandle`]; releases the handle when dropped.
pub struct PinnedFrame<'h, H: FrameHandle + ?Sized> {
    handle: &'h mut H,
}

impl<'h, H: FrameHandle + ?Sized> PinnedFrame<'h, H> {
    pub fn pin(handle: &'h mut H) -> Result<Self> {
        handle.pin()?;
        Ok(PinnedFrame { handle })
    }

    pub fn bytes(&self) -> &[u8] {
        self.handle.bytes()
    }
}

impl<H: FrameHandle + ?Sized> Drop for PinnedFrame<'_, H> {
    fn drop(&mut self) {
        self.handle.release();
    }
}

/// Entry point for frame processing with a strategy chosen at startup.
///
/// `FrameProcessor` is stateless between calls and can be shared across
/// threads; every call allocates its own output.
///
/// # Example
///
/// ```
/// use edgefirst_edge::{FrameProcessor, StrategyKind};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let processor = FrameProcessor::new(StrategyKind::Approximate);
/// let frame: &[u8] = &[255, 0, 0, 255, 0, 255, 0, 255];
///
/// let gray = processor.to_grayscale(Some(frame), 2, 1)?;
/// assert_eq!(gray.as_slice(), &[76, 76, 76, 255, 150, 150, 150, 255]);
///
/// let edges = processor.process_frame(Some(frame), 2, 1)?;
/// assert_eq!(edges.as_slice(), &[179, 179, 179, 255, 105, 105, 105, 255]);
/// # Ok(())
/// # }
/// ```
pub struct FrameProcessor {
    strategy: Box<dyn EdgeStrategy>,
}

impl FrameProcessor {
    /// Creates a processor for `kind` with the default Canny parameters.
    pub fn new(kind: StrategyKind) -> Self {
        Self::with_params(kind, CannyParams::default())
    }

    pub fn with_params(kind: StrategyKind, params: CannyParams) -> Self {
        Self::with_strategy(kind.build(params))
    }

    pub fn with_strategy(strategy: Box<dyn EdgeStrategy>) -> Self {
        debug!("frame processor using {}", strategy.version());
        FrameProcessor { strategy }
    }

    pub fn backend(&self) -> Backend {
        self.strategy.backend()
    }

    /// Identifies the active strategy and its mode. Never empty.
    pub fn version(&self) -> &str {
        self.strategy.version()
    }

    /// Edge-detects a borrowed RGBA frame.
    pub fn process_frame(&self, frame: Option<&[u8]>, width: i32, height: i32) -> Result<FrameBuffer> {
        let mut handle = frame.map(SliceFrame);
        self.process(handle.as_mut(), width, height, Operation::Edges)
    }

    /// Converts a borrowed RGBA frame to grayscale.
    pub fn to_grayscale(&self, frame: Option<&[u8]>, width: i32, height: i32) -> Result<FrameBuffer> {
        let mut handle = frame.map(SliceFrame);
        self.process(handle.as_mut(), width, height, Operation::Grayscale)
    }

    /// Validates, pins, processes and releases a caller's frame.
    ///
    /// A missing handle fails before anything is pinned or allocated. Once
    /// pinned, the handle is released exactly once whether processing
    /// succeeds, fails to allocate, or faults.
    pub fn process<H: FrameHandle + ?Sized>(
        &self,
        handle: Option<&mut H>,
        width: i32,
        height: i32,
        op: Operation,
    ) -> Result<FrameBuffer> {
        let handle = handle.ok_or_else(|| {
            warn!("{} requested on a null frame", op);
            FrameError::NullBuffer
        })?;
        let pinned = PinnedFrame::pin(handle).inspect_err(|e| warn!("{}: {}", op, e))?;

        let now = Instant::now();
        let frame = FrameView::new(pinned.bytes(), width, height);
        let out = self
            .strategy
            .run(op, &frame)
            .inspect_err(|e| warn!("{} {} failed: {}", op, frame, e))?;
        debug!("{} {} in {:?}", op, frame, now.elapsed());

        Ok(out)
    }
}
