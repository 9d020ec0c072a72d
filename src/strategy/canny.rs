// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Gaussian smoothing and Canny edge extraction on single channel images.
//!
//! Gradients come from the Sobel operators of `imageproc`, which replicate
//! the border. Magnitude is the L1 norm `|gx| + |gy|`. Non-maximum
//! suppression compares against the two neighbours along the gradient
//! direction quantized to 0, 45, 90 or 135 degrees, with magnitude outside
//! the image taken as zero. Hysteresis keeps weak candidates that are
//! 8-connected to a strong one.
//!
//! Scratch storage is reserved fallibly and reported as
//! [`FrameError::Allocation`]. The Sobel images are allocated inside
//! `imageproc`.

use crate::{
    error::{FrameError, Result},
    frame::CHANNELS,
};
use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

const TAN_22_5_DEG: f32 = 0.414_213_57;
const TAN_67_5_DEG: f32 = 2.414_213_6;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Empty buffer with room for `len` elements.
fn reserve<T>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| FrameError::Allocation {
        len: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    Ok(buf)
}

/// Scratch buffer of `len` elements filled with `value`.
fn scratch<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buf = reserve(len)?;
    buf.resize(len, value);
    Ok(buf)
}

fn gray_image(width: usize, height: usize) -> Result<GrayImage> {
    let len = width.checked_mul(height).ok_or(FrameError::Allocation { len: usize::MAX })?;
    GrayImage::from_raw(width as u32, height as u32, scratch(len, 0u8)?).ok_or_else(|| {
        FrameError::Backend(format!("cannot build a {}x{} gray image", width, height))
    })
}

/// Converts the first `rows` rows of an RGBA buffer to gray.
///
/// Uses the fixed-point BT.601 weights common to vision libraries,
/// `(R*4899 + G*9617 + B*1868 + 8192) >> 14`.
pub fn rgba_to_gray(data: &[u8], width: usize, rows: usize) -> Result<GrayImage> {
    let mut gray = gray_image(width, rows)?;
    let dst: &mut [u8] = &mut gray;
    for (g, px) in dst.iter_mut().zip(data.chunks_exact(CHANNELS)) {
        let v = px[0] as u32 * 4899 + px[1] as u32 * 9617 + px[2] as u32 * 1868 + (1 << 13);
        *g = (v >> 14) as u8;
    }
    Ok(gray)
}

/// Normalized 1-D Gaussian kernel of odd `size`.
pub fn gaussian_kernel_1d(sigma: f32, size: usize) -> Vec<f32> {
    let center = (size / 2) as isize;
    let sigma2 = sigma * sigma;
    let mut kernel: Vec<f32> = (0..size as isize)
        .map(|i| {
            let x = (i - center) as f32;
            (-(x * x) / (2.0 * sigma2)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    if sum != 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }
    kernel
}

/// Maps an out-of-range coordinate back inside `0..n` by mirroring without
/// repeating the edge sample (`gfedcb|abcdefgh|gfedcba`).
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}

/// Separable Gaussian blur with a `size` x `size` kernel.
pub fn gaussian_blur(src: &GrayImage, sigma: f32, size: usize) -> Result<GrayImage> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut out = gray_image(w, h)?;
    if w == 0 || h == 0 {
        return Ok(out);
    }

    let kernel = gaussian_kernel_1d(sigma, size);
    let radius = (size / 2) as isize;
    let pixels = src.as_raw();

    let mut horizontal = scratch(w * h, 0.0f32)?;
    for y in 0..h {
        let row = &pixels[y * w..(y + 1) * w];
        for x in 0..w {
            horizontal[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = reflect101(x as isize + k as isize - radius, w);
                    weight * row[sx] as f32
                })
                .sum();
        }
    }

    let dst: &mut [u8] = &mut out;
    for y in 0..h {
        for x in 0..w {
            let v: f32 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sy = reflect101(y as isize + k as isize - radius, h);
                    weight * horizontal[sy * w + x]
                })
                .sum();
            dst[y * w + x] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

/// Canny edge extraction producing a binary mask (255 edge, 0 background).
///
/// No smoothing is applied here; blur the input first. Thresholds given in
/// the wrong order are swapped.
pub fn canny(src: &GrayImage, low_threshold: f32, high_threshold: f32) -> Result<GrayImage> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut out = gray_image(w, h)?;
    if w == 0 || h == 0 {
        return Ok(out);
    }
    let (low, high) = if high_threshold < low_threshold {
        (high_threshold, low_threshold)
    } else {
        (low_threshold, high_threshold)
    };

    let gx = horizontal_sobel(src);
    let gy = vertical_sobel(src);
    let (gx, gy) = (gx.as_raw(), gy.as_raw());
    let mut mag = scratch(w * h, 0i32)?;
    for ((m, &x), &y) in mag.iter_mut().zip(gx.iter()).zip(gy.iter()) {
        *m = (x as i32).abs() + (y as i32).abs();
    }

    let mag_at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            mag[y as usize * w + x as usize]
        }
    };

    let mut state = scratch(w * h, NONE)?;
    // each pixel is pushed at most once
    let mut stack: Vec<(usize, usize)> = reserve(w * h)?;

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let m = mag[idx];
            if (m as f32) <= low {
                continue;
            }

            let ax = (gx[idx] as f32).abs();
            let ay = (gy[idx] as f32).abs();
            let (xi, yi) = (x as isize, y as isize);
            let is_max = if ay < ax * TAN_22_5_DEG {
                m > mag_at(xi - 1, yi) && m >= mag_at(xi + 1, yi)
            } else if ay > ax * TAN_67_5_DEG {
                m > mag_at(xi, yi - 1) && m >= mag_at(xi, yi + 1)
            } else {
                let s = if (gx[idx] < 0) != (gy[idx] < 0) { -1 } else { 1 };
                m > mag_at(xi - s, yi - 1) && m > mag_at(xi + s, yi + 1)
            };
            if !is_max {
                continue;
            }

            if m as f32 > high {
                state[idx] = STRONG;
                stack.push((x, y));
            } else {
                state[idx] = WEAK;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let nidx = ny * w + nx;
                if state[nidx] == WEAK {
                    state[nidx] = STRONG;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let dst: &mut [u8] = &mut out;
    for (px, s) in dst.iter_mut().zip(state) {
        *px = if s == STRONG { 255 } else { 0 };
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_image(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| image::Luma([if x < w / 2 { 0 } else { 255 }]))
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel_1d(1.5, 5);
        assert_eq!(k.len(), 5);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((k[0] - k[4]).abs() < 1e-6);
        assert!((k[1] - k[3]).abs() < 1e-6);
        assert!(k[2] > k[1] && k[1] > k[0]);
    }

    #[test]
    fn reflect101_mirrors_without_edge_repeat() {
        assert_eq!(reflect101(-1, 8), 1);
        assert_eq!(reflect101(-2, 8), 2);
        assert_eq!(reflect101(8, 8), 6);
        assert_eq!(reflect101(9, 8), 5);
        assert_eq!(reflect101(3, 8), 3);
        assert_eq!(reflect101(-2, 2), 0);
        assert_eq!(reflect101(5, 1), 0);
    }

    #[test]
    fn gray_weights_saturate_at_white() {
        let gray = rgba_to_gray(&[255, 255, 255, 255, 255, 0, 0, 255], 2, 1).unwrap();
        assert_eq!(gray.as_raw(), &vec![255, 76]);
    }

    #[test]
    fn blur_keeps_flat_image_flat() {
        let flat = GrayImage::from_pixel(9, 7, image::Luma([120]));
        let blurred = gaussian_blur(&flat, 1.5, 5).unwrap();
        assert!(blurred.as_raw().iter().all(|&v| v == 120));
    }

    #[test]
    fn flat_image_has_no_edges() {
        let flat = GrayImage::from_pixel(16, 16, image::Luma([200]));
        let edges = canny(&flat, 50.0, 150.0).unwrap();
        assert!(edges.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn step_edge_is_thin_and_centered() {
        let blurred = gaussian_blur(&step_image(16, 12), 1.5, 5).unwrap();
        let edges = canny(&blurred, 50.0, 150.0).unwrap();

        let mut found = 0;
        for (x, _, px) in edges.enumerate_pixels() {
            if px.0[0] == 255 {
                assert!((6..=9).contains(&x), "edge at column {x}");
                found += 1;
            } else {
                assert_eq!(px.0[0], 0);
            }
        }
        assert!(found >= 12, "expected an edge on every row, found {found}");
    }

    #[test]
    fn empty_image_is_handled() {
        let empty = GrayImage::new(0, 0);
        let blurred = gaussian_blur(&empty, 1.5, 5).unwrap();
        assert_eq!(canny(&blurred, 50.0, 150.0).unwrap().len(), 0);
    }

    #[test]
    fn threshold_order_does_not_matter() {
        // strong step on top, faint step below
        let img = GrayImage::from_fn(24, 16, |x, y| {
            let hi = if y < 8 { 255 } else { 70 };
            image::Luma([if x < 12 { 0 } else { hi }])
        });
        let blurred = gaussian_blur(&img, 1.5, 5).unwrap();

        let ordered = canny(&blurred, 50.0, 150.0).unwrap();
        let swapped = canny(&blurred, 150.0, 50.0).unwrap();
        assert_eq!(ordered, swapped);
        assert!(ordered.as_raw().iter().any(|&v| v == 255));
    }

    #[test]
    fn oversized_scratch_is_reported() {
        match scratch(usize::MAX, 0.0f32) {
            Err(FrameError::Allocation { len }) => assert_eq!(len, usize::MAX),
            other => panic!("unexpected {:?}", other.map(|v| v.len())),
        }
        assert!(matches!(
            gray_image(usize::MAX, 2),
            Err(FrameError::Allocation { .. })
        ));
    }
}
