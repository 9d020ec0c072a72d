// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_edge::{
    encode::{encode_jpeg, encode_png},
    stats::{FrameRateMeter, FrameStats},
    FrameError, FrameProcessor, StrategyKind,
};
use std::{error::Error, time::Duration};

#[test]
fn test_png_roundtrip_of_edges() -> Result<(), Box<dyn Error>> {
    let processor = FrameProcessor::new(StrategyKind::Approximate);
    let frame: Vec<u8> = (0..64 * 48 * 4).map(|i| (i % 251) as u8).collect();
    let edges = processor.process_frame(Some(&frame[..]), 64, 48)?;

    let png = encode_png(edges.as_slice(), 64, 48)?;
    println!("png {} bytes", png.len());

    let decoded = image::load_from_memory(&png)?.to_rgba8();
    assert_eq!(decoded.dimensions(), (64, 48));
    assert_eq!(decoded.as_raw(), edges.as_slice());
    Ok(())
}

#[test]
fn test_jpeg_dimensions() -> Result<(), Box<dyn Error>> {
    let frame = vec![128u8; 320 * 240 * 4];
    let jpeg = encode_jpeg(&frame, 320, 240, 75)?;

    let decoded = image::load_from_memory(&jpeg)?;
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
    Ok(())
}

#[test]
fn test_encode_rejects_short_buffer() {
    let frame = vec![0u8; 10];
    assert!(matches!(encode_png(&frame, 4, 4), Err(FrameError::Encode(_))));
    assert!(matches!(encode_jpeg(&frame, 4, 4, 90), Err(FrameError::Encode(_))));
}

#[test]
fn test_frame_rate_meter() {
    let mut meter = FrameRateMeter::new(4);
    for _ in 0..4 {
        meter.record(Duration::from_millis(20));
    }
    assert_eq!(meter.record(Duration::from_millis(20)), 50);

    // a single slow frame pulls the average down
    assert_eq!(meter.record(Duration::from_millis(100)), 40);
}

#[test]
fn test_frame_stats_json() -> Result<(), Box<dyn Error>> {
    let stats = FrameStats::new(30, 640, 480, Some(Duration::from_millis(500)));
    let json: serde_json::Value = serde_json::to_value(&stats)?;
    assert_eq!(json["fps"], 30);
    assert_eq!(json["width"], 640);
    assert_eq!(json["processingTime"], 500.0);
    assert!(json["timestamp"].as_u64().is_some_and(|t| t > 0));

    let raw = serde_json::to_value(FrameStats::new(30, 640, 480, None))?;
    assert!(raw.get("processingTime").is_none());
    Ok(())
}

#[test]
fn test_png_ignores_trailing_bytes() -> Result<(), Box<dyn Error>> {
    let mut frame: Vec<u8> = (0..8 * 4 * 4).map(|i| i as u8).collect();
    let pixels = frame.clone();
    frame.extend_from_slice(&[1, 2, 3]);

    let png = encode_png(&frame, 8, 4)?;
    let decoded = image::load_from_memory(&png)?.to_rgba8();
    assert_eq!(decoded.as_raw(), &pixels);
    Ok(())
}
