// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use serde::Serialize;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Rolling frame rate over the last `window` frames.
pub struct FrameRateMeter {
    prev: Instant,
    history: Vec<i64>,
    index: usize,
}

impl FrameRateMeter {
    pub fn new(window: usize) -> Self {
        FrameRateMeter {
            prev: Instant::now(),
            history: vec![0; window.max(1)],
            index: 0,
        }
    }

    /// Records a frame arriving now and returns the averaged rate.
    pub fn tick(&mut self) -> i64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.prev);
        self.prev = now;
        self.record(elapsed)
    }

    /// Records a frame that arrived `elapsed` after the previous one.
    pub fn record(&mut self, elapsed: Duration) -> i64 {
        let nanos = elapsed.as_nanos().max(1) as i64;
        self.history[self.index] = 1e9 as i64 / nanos;
        self.index = (self.index + 1) % self.history.len();

        (self.history.iter().sum::<i64>() as f64 / self.history.len() as f64).round() as i64
    }
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Per-frame statistics as consumed by the frame viewer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub fps: i64,
    pub width: u32,
    pub height: u32,
    /// Processing time in milliseconds, absent for raw frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl FrameStats {
    pub fn new(fps: i64, width: u32, height: u32, processing_time: Option<Duration>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        FrameStats {
            fps,
            width,
            height,
            processing_time: processing_time.map(|d| d.as_secs_f64() * 1000.0),
            timestamp,
        }
    }
}
