// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Interchangeable frame processing strategies.
//!
//! Both strategies honour the same contract: given a borrowed RGBA frame
//! they return a newly allocated RGBA frame of identical length, or a
//! [`FrameError`](crate::error::FrameError). A caller can only tell them
//! apart by output quality and by [`EdgeStrategy::version`].

mod approximate;
#[cfg(feature = "vision")]
mod canny;
mod gradient;

pub use approximate::ApproximateEdgeStrategy;
pub use gradient::{CannyParams, GradientEdgeStrategy};

use crate::{error::Result, frame::FrameBuffer, frame::FrameView};
use core::fmt;

/// The operation requested for a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Edge-detect the frame.
    Edges,
    /// Grayscale conversion only.
    Grayscale,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Edges => write!(f, "edges"),
            Operation::Grayscale => write!(f, "grayscale"),
        }
    }
}

/// Processing backend that actually produced a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Dependency-free arithmetic.
    Simple,
    /// Gradient pipeline backed by the vision library.
    Vision,
    /// Gradient strategy built without its vision library, passing frames
    /// through unchanged.
    Unavailable,
}

/// Strategy selection, made once at process startup.
#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    /// Luma inversion edge approximation, no external dependency
    Approximate,
    /// Gaussian blur followed by Canny hysteresis
    Gradient,
}

impl StrategyKind {
    /// Instantiates the selected strategy.
    pub fn build(self, params: CannyParams) -> Box<dyn EdgeStrategy> {
        match self {
            StrategyKind::Approximate => Box::new(ApproximateEdgeStrategy),
            StrategyKind::Gradient => Box::new(GradientEdgeStrategy::new(params)),
        }
    }
}

impl Default for StrategyKind {
    /// The gradient strategy when its vision library is compiled in,
    /// otherwise the approximate one.
    fn default() -> Self {
        if cfg!(feature = "vision") {
            StrategyKind::Gradient
        } else {
            StrategyKind::Approximate
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        <StrategyKind as clap::ValueEnum>::from_str(s.trim(), true)
    }
}

/// Common contract of the frame processors.
pub trait EdgeStrategy: Send + Sync {
    /// Backend this strategy runs on in the current build.
    fn backend(&self) -> Backend;

    /// Human readable identification of the strategy and its mode.
    fn version(&self) -> &str;

    /// Grayscale conversion, re-expanded to RGBA with opaque alpha.
    fn grayscale(&self, frame: &FrameView<'_>) -> Result<FrameBuffer>;

    /// Edge map, expanded to RGBA with opaque alpha.
    fn edges(&self, frame: &FrameView<'_>) -> Result<FrameBuffer>;

    fn run(&self, op: Operation, frame: &FrameView<'_>) -> Result<FrameBuffer> {
        match op {
            Operation::Edges => self.edges(frame),
            Operation::Grayscale => self.grayscale(frame),
        }
    }
}
