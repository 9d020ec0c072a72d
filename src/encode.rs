// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    error::{FrameError, Result},
    frame::CHANNELS,
};
use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    ExtendedColorType, ImageEncoder, RgbaImage,
};
use std::io;

/// The leading `width * height` RGBA pixels of `pix`. Trailing bytes are
/// ignored.
fn rgba_pixels(pix: &[u8], width: u32, height: u32) -> Result<&[u8]> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .and_then(|len| pix.get(..len))
        .ok_or_else(|| {
            FrameError::Encode(image::ImageError::IoError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} bytes do not hold a {}x{} RGBA frame", pix.len(), width, height),
            )))
        })
}

/// Encodes an RGBA frame to PNG.
pub fn encode_png(pix: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels = rgba_pixels(pix, width, height)?;
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(pixels, width, height, ExtendedColorType::Rgba8)?;
    Ok(out)
}

/// Encodes an RGBA frame to JPEG at `quality` (1-100).
///
/// JPEG has no alpha channel, so alpha is dropped.
///
/// # Example
///
/// ```
/// use edgefirst_edge::encode::encode_jpeg;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let frame = vec![255u8; 16 * 16 * 4];
/// let jpeg = encode_jpeg(&frame, 16, 16, 90)?;
/// assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
/// # Ok(())
/// # }
/// ```
pub fn encode_jpeg(pix: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let pixels = rgba_pixels(pix, width, height)?.to_vec();
    let rgba = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        FrameError::Backend(format!("cannot build a {}x{} RGBA image", width, height))
    })?;
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(out)
}
