// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Edge Library
//!
//! Real-time edge detection for camera frames. A caller hands over an RGBA
//! frame, the library converts it to grayscale and optionally extracts
//! edges, and a new RGBA frame of identical size comes back for display.
//!
//! ## Features
//!
//! - **Two strategies, one contract**: [`ApproximateEdgeStrategy`] is a
//!   dependency-free luma inversion, [`GradientEdgeStrategy`] runs Gaussian
//!   smoothing and Canny hysteresis. Both implement [`EdgeStrategy`] and are
//!   picked at startup through [`StrategyKind`].
//! - **Borrowed input, owned output**: the caller's frame is pinned and
//!   released exactly once per call, see [`bridge`].
//! - **C ABI**: the [`ffi`] module exposes the same operations to foreign
//!   callers, returning null instead of unwinding on any failure.
//! - **Encoding**: PNG and JPEG output for processed frames.
//!
//! ## Cargo features
//!
//! - `vision` (default): builds the gradient strategy on `imageproc`.
//!   Without it the gradient strategy passes frames through unchanged.
//! - `tracy` (default), `profiling`: Tracy profiler integration for the
//!   `edgefirst-edge` binary.
//!
//! ## Example
//!
//! ```
//! use edgefirst_edge::{FrameProcessor, StrategyKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let processor = FrameProcessor::new(StrategyKind::Gradient);
//! let frame = vec![0u8; 640 * 480 * 4];
//!
//! let edges = processor.process_frame(Some(frame.as_slice()), 640, 480)?;
//! assert_eq!(edges.len(), frame.len());
//! println!("{}", processor.version());
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod encode;
pub mod error;
pub mod ffi;
pub mod frame;
pub mod stats;
pub mod strategy;

pub use bridge::FrameProcessor;
pub use error::FrameError;
pub use frame::{FrameBuffer, FrameView};
pub use strategy::{
    ApproximateEdgeStrategy, Backend, CannyParams, EdgeStrategy, GradientEdgeStrategy, Operation,
    StrategyKind,
};
