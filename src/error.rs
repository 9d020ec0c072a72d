// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use thiserror::Error;

/// Failure of a single frame operation.
///
/// Every variant is terminal for the frame that produced it. Callers are
/// expected to skip the frame and continue with the next capture.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The caller passed no buffer at all.
    #[error("frame buffer is null")]
    NullBuffer,

    /// The caller's buffer exists but its storage could not be pinned.
    #[error("frame buffer is not accessible: {0}")]
    Inaccessible(String),

    /// Output or scratch storage could not be obtained.
    #[error("failed to allocate {len} bytes for frame output")]
    Allocation { len: usize },

    /// The processing backend faulted while working on the frame.
    #[error("backend fault: {0}")]
    Backend(String),

    /// Encoding a processed frame for storage failed.
    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T, E = FrameError> = std::result::Result<T, E>;

/// Extracts the message carried by a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
