// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use super::{Backend, EdgeStrategy};
use crate::{
    error::Result,
    frame::{FrameBuffer, FrameView},
};
use tracing::warn;

#[cfg(feature = "vision")]
use super::canny;

/// Parameters of the smoothing and hysteresis stages.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CannyParams {
    /// Gradient magnitude above which a pixel may join an edge.
    pub low_threshold: f32,
    /// Gradient magnitude above which a pixel seeds an edge. Swapped with
    /// `low_threshold` when smaller.
    pub high_threshold: f32,
    /// Standard deviation of the Gaussian pre-filter.
    pub blur_sigma: f32,
    /// Side of the square Gaussian kernel, odd.
    pub blur_size: usize,
}

impl Default for CannyParams {
    fn default() -> Self {
        CannyParams {
            low_threshold: 50.0,
            high_threshold: 150.0,
            blur_sigma: 1.5,
            blur_size: 5,
        }
    }
}

/// Edge detection by Gaussian smoothing followed by Canny hysteresis.
///
/// Built without the `vision` feature this strategy has no vision library
/// to run on and returns a byte-for-byte copy of every input frame, so the
/// caller still receives a frame of the expected shape.
///
/// # Example
///
/// ```
/// use edgefirst_edge::frame::FrameView;
/// use edgefirst_edge::strategy::{CannyParams, EdgeStrategy, GradientEdgeStrategy};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let strategy = GradientEdgeStrategy::new(CannyParams::default());
/// let pixels = vec![128u8; 8 * 8 * 4];
/// let edges = strategy.edges(&FrameView::new(&pixels, 8, 8))?;
/// assert_eq!(edges.len(), pixels.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GradientEdgeStrategy {
    params: CannyParams,
    version: String,
}

impl GradientEdgeStrategy {
    pub fn new(params: CannyParams) -> Self {
        let mode = if cfg!(feature = "vision") {
            "Vision Mode, Canny"
        } else {
            warn!("vision backend not compiled in, frames will pass through unchanged");
            "Vision Unavailable, pass-through"
        };
        GradientEdgeStrategy {
            params,
            version: format!("EdgeFirst Edge v{} ({})", env!("CARGO_PKG_VERSION"), mode),
        }
    }

    pub fn params(&self) -> CannyParams {
        self.params
    }
}

impl Default for GradientEdgeStrategy {
    fn default() -> Self {
        Self::new(CannyParams::default())
    }
}

#[cfg(feature = "vision")]
impl GradientEdgeStrategy {
    /// Runs `stage` on the gray conversion of `frame` and expands the
    /// result back to RGBA.
    ///
    /// Panics raised while processing are caught here and reported as
    /// [`FrameError::Backend`](crate::error::FrameError::Backend).
    fn process<F>(&self, frame: &FrameView<'_>, stage: F) -> Result<FrameBuffer>
    where
        F: FnOnce(image::GrayImage) -> Result<image::GrayImage>,
    {
        use crate::error::{panic_message, FrameError};
        use std::panic::{catch_unwind, AssertUnwindSafe};
        use tracing::error;

        let rows = frame.covered_rows().ok_or_else(|| {
            FrameError::Backend(format!(
                "invalid frame geometry {}x{}",
                frame.width(),
                frame.height()
            ))
        })?;
        if !frame.is_consistent() {
            warn!(
                "frame {} does not match its dimensions, processing {} rows",
                frame, rows
            );
        }

        let width = frame.width() as usize;
        let processed = catch_unwind(AssertUnwindSafe(|| {
            stage(canny::rgba_to_gray(frame.as_slice(), width, rows)?)
        }))
        .map_err(|payload| {
            let msg = panic_message(payload.as_ref());
            error!("vision backend fault: {}", msg);
            FrameError::Backend(msg)
        })??;

        expand_gray(&processed, frame.len())
    }
}

/// Expands a single channel image to opaque RGBA inside a buffer of the
/// caller's frame length.
///
/// The expanded size is derived from the processed image itself and must
/// fit within the frame. Bytes past the image stay zero.
#[cfg(feature = "vision")]
fn expand_gray(gray: &image::GrayImage, frame_len: usize) -> Result<FrameBuffer> {
    use crate::{error::FrameError, frame::CHANNELS};

    let samples = gray.as_raw();
    let produced = samples.len() * std::mem::size_of::<u8>() * CHANNELS;
    if produced > frame_len {
        return Err(FrameError::Backend(format!(
            "processed frame of {} bytes exceeds input of {} bytes",
            produced, frame_len
        )));
    }

    let mut out = FrameBuffer::try_zeroed(frame_len)?;
    for (&v, mut px) in samples.iter().zip(out.pixels_mut()) {
        px.set_gray(v);
    }
    Ok(out)
}

impl EdgeStrategy for GradientEdgeStrategy {
    fn backend(&self) -> Backend {
        if cfg!(feature = "vision") {
            Backend::Vision
        } else {
            Backend::Unavailable
        }
    }

    fn version(&self) -> &str {
        &self.version
    }

    #[cfg(feature = "vision")]
    fn grayscale(&self, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        let out = self.process(frame, Ok)?;
        tracing::debug!("grayscale {} (vision mode)", frame);
        Ok(out)
    }

    #[cfg(feature = "vision")]
    fn edges(&self, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        let p = self.params;
        let out = self.process(frame, |gray| {
            let blurred = canny::gaussian_blur(&gray, p.blur_sigma, p.blur_size)?;
            canny::canny(&blurred, p.low_threshold, p.high_threshold)
        })?;
        tracing::debug!("edges {} (vision mode)", frame);
        Ok(out)
    }

    #[cfg(not(feature = "vision"))]
    fn grayscale(&self, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        tracing::debug!("grayscale {} passed through", frame);
        FrameBuffer::try_copy_of(frame.as_slice())
    }

    #[cfg(not(feature = "vision"))]
    fn edges(&self, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        tracing::debug!("edges {} passed through", frame);
        FrameBuffer::try_copy_of(frame.as_slice())
    }
}
