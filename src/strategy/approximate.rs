// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use super::{Backend, EdgeStrategy};
use crate::{error::Result, frame::FrameBuffer, frame::FrameView};
use std::sync::OnceLock;
use tracing::debug;

/// Dependency-free frame processor.
///
/// Grayscale uses BT.601 luma. The "edge" output is the inverted luma,
/// `255 - gray`. That is not a gradient detector: inverted luma merely
/// makes contrast boundaries stand out. It is kept literal on purpose as
/// the low-fidelity tier with predictable output; the gradient strategy is
/// the one that finds real edges.
///
/// Declared width and height are ignored, the sweep covers the whole
/// buffer.
#[derive(Copy, Clone, Debug, Default)]
pub struct ApproximateEdgeStrategy;

impl ApproximateEdgeStrategy {
    fn map_luma(frame: &FrameView<'_>, f: impl Fn(u8) -> u8) -> Result<FrameBuffer> {
        let mut out = FrameBuffer::try_zeroed(frame.len())?;
        for (src, mut dst) in frame.pixels().zip(out.pixels_mut()) {
            dst.set_gray(f(src.luma()));
        }
        Ok(out)
    }
}

impl EdgeStrategy for ApproximateEdgeStrategy {
    fn backend(&self) -> Backend {
        Backend::Simple
    }

    fn version(&self) -> &str {
        static VERSION: OnceLock<String> = OnceLock::new();
        VERSION.get_or_init(|| {
            format!(
                "EdgeFirst Edge v{} (Simple Mode)",
                env!("CARGO_PKG_VERSION")
            )
        })
    }

    fn grayscale(&self, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        let out = Self::map_luma(frame, |gray| gray)?;
        debug!("grayscale {} (simple mode)", frame);
        Ok(out)
    }

    fn edges(&self, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        let out = Self::map_luma(frame, |gray| 255 - gray)?;
        debug!("edges {} (simple mode)", frame);
        Ok(out)
    }
}
