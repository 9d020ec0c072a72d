// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_edge::{CannyParams, StrategyKind};
use std::{num::TryFromIntError, path::PathBuf};
use tracing::level_filters::LevelFilter;

/// What to do with each frame.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum ProcessMode {
    /// Pass camera frames through untouched
    Raw,
    /// Grayscale conversion only
    Grayscale,
    /// Edge detection
    Edges,
}

/// Storage format for processed frames.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum OutputFormat {
    /// Raw RGBA bytes, all frames appended to one file
    Raw,
    /// One PNG per frame
    Png,
    /// One JPEG per frame
    Jpeg,
}

/// Command-line arguments for the EdgeFirst edge detector.
///
/// Frames are read as raw RGBA, back to back, from a file or stdin. Each
/// frame is processed with the selected strategy and optionally written
/// out. Arguments can be given on the command line or through the
/// environment.
///
/// # Example
///
/// ```bash
/// # Edge-detect a 640x480 capture and store PNGs
/// edgefirst-edge --input capture.rgba --size "640 480" --output frames/
///
/// # Via environment variables
/// export STRATEGY=approximate
/// export MODE=grayscale
/// edgefirst-edge --input - < capture.rgba
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw RGBA frame source, "-" for stdin
    #[arg(short, long, env = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Frame resolution in pixels (width height)
    #[arg(
        short,
        long,
        env = "FRAME_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub size: Vec<u32>,

    /// Processing strategy
    #[arg(long, env = "STRATEGY", default_value = "gradient", value_enum)]
    pub strategy: StrategyKind,

    /// Processing applied to each frame
    #[arg(short, long, env = "MODE", default_value = "edges", value_enum)]
    pub mode: ProcessMode,

    /// Directory for processed frames, nothing is written when absent
    #[arg(short, long, env = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output storage format
    #[arg(long, env = "OUTPUT_FORMAT", default_value = "png", value_enum)]
    pub format: OutputFormat,

    /// JPEG quality (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value = "90")]
    pub jpeg_quality: u8,

    /// Pace input to this many frames per second, unpaced when absent
    #[arg(long, env = "FPS")]
    pub fps: Option<u32>,

    /// Print one JSON stats line per frame to stdout
    #[arg(long, env = "STATS")]
    pub stats: bool,

    /// Canny hysteresis thresholds (low high)
    #[arg(
        long,
        env = "CANNY_THRESHOLDS",
        default_value = "50 150",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub canny_thresholds: Vec<f32>,

    /// Enable verbose per-frame logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Application log level
    #[arg(long, env = "RUST_LOG", default_value = "INFO")]
    pub rust_log: LevelFilter,

    /// Enable Tokio async runtime console for debugging
    #[arg(long, env = "TOKIO_CONSOLE")]
    pub tokio_console: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn width(&self) -> u32 {
        self.size[0]
    }

    pub fn height(&self) -> u32 {
        self.size[1]
    }

    /// Frame size in the signed form the processor takes.
    pub fn dims(&self) -> Result<(i32, i32), TryFromIntError> {
        Ok((i32::try_from(self.width())?, i32::try_from(self.height())?))
    }

    /// Bytes in one RGBA frame of the configured size.
    pub fn frame_len(&self) -> usize {
        self.width() as usize * self.height() as usize * 4
    }

    pub fn canny_params(&self) -> CannyParams {
        CannyParams {
            low_threshold: self.canny_thresholds[0],
            high_threshold: self.canny_thresholds[1],
            ..CannyParams::default()
        }
    }
}
