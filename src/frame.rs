// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Bounds-checked views over interleaved RGBA frame buffers.
//!
//! Frames are flat `u8` buffers in R, G, B, A order, row-major with no
//! padding. All sweeps step over the buffer in 4-byte pixels and are bounded
//! by the buffer's own length, so a caller that reports the wrong width or
//! height gets a visually wrong frame rather than an out-of-bounds access.

use crate::error::{FrameError, Result};
use core::fmt;

/// Bytes per pixel of the only supported layout.
pub const CHANNELS: usize = 4;

/// Fully opaque alpha, written into every output pixel.
pub const OPAQUE: u8 = 255;

/// A single RGBA pixel read from a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[inline]
    fn from_chunk(px: &[u8]) -> Self {
        Rgba {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }

    /// ITU-R BT.601 luma with floating-point weights, rounded to 8 bits.
    ///
    /// The weights sum to 1.0 so the result never exceeds 255 before the
    /// cast, and the float to `u8` cast saturates regardless.
    #[inline]
    pub fn luma(&self) -> u8 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32).round() as u8
    }
}

/// Mutable access to one output pixel.
pub struct PixelMut<'a>(&'a mut [u8]);

impl PixelMut<'_> {
    #[inline]
    pub fn set_r(&mut self, v: u8) {
        self.0[0] = v;
    }

    #[inline]
    pub fn set_g(&mut self, v: u8) {
        self.0[1] = v;
    }

    #[inline]
    pub fn set_b(&mut self, v: u8) {
        self.0[2] = v;
    }

    #[inline]
    pub fn set_a(&mut self, v: u8) {
        self.0[3] = v;
    }

    /// Writes `v` into all three color channels and forces alpha opaque.
    #[inline]
    pub fn set_gray(&mut self, v: u8) {
        self.set_r(v);
        self.set_g(v);
        self.set_b(v);
        self.set_a(OPAQUE);
    }
}

/// Read-only view over a borrowed RGBA frame.
///
/// The view never copies or mutates the caller's bytes. `width` and
/// `height` are the caller's declared dimensions and are not validated
/// against the buffer length.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: i32,
    height: i32,
}

impl<'a> FrameView<'a> {
    pub fn new(data: &'a [u8], width: i32, height: i32) -> Self {
        FrameView {
            data,
            width,
            height,
        }
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// True when the declared dimensions describe exactly this buffer.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && (self.width as usize)
                .checked_mul(self.height as usize)
                .and_then(|n| n.checked_mul(CHANNELS))
                == Some(self.data.len())
    }

    /// Number of whole rows of the declared width that the buffer holds,
    /// capped at the declared height.
    ///
    /// Returns `None` when the declared geometry cannot describe an image.
    pub fn covered_rows(&self) -> Option<usize> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        let stride = self.width as usize * CHANNELS;
        Some((self.data.len() / stride).min(self.height as usize))
    }

    /// Iterates whole pixels in buffer order. A trailing partial pixel is
    /// not visited.
    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + 'a {
        self.data.chunks_exact(CHANNELS).map(Rgba::from_chunk)
    }
}

impl fmt::Display for FrameView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} RGBA len:{}", self.width, self.height, self.len())
    }
}

/// Frame storage allocated and owned by the processor until it is handed to
/// the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocates a zeroed buffer of `len` bytes, reporting allocation
    /// failure instead of aborting.
    pub fn try_zeroed(len: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FrameError::Allocation { len })?;
        data.resize(len, 0);
        Ok(FrameBuffer { data })
    }

    /// Allocates a buffer holding a copy of `src`.
    pub fn try_copy_of(src: &[u8]) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(src.len())
            .map_err(|_| FrameError::Allocation { len: src.len() })?;
        data.extend_from_slice(src);
        Ok(FrameBuffer { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixels_mut(&mut self) -> impl Iterator<Item = PixelMut<'_>> {
        self.data.chunks_exact_mut(CHANNELS).map(PixelMut)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FrameBuffer(len:{})", self.data.len())
    }
}

impl AsRef<[u8]> for FrameBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
