// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_edge::{
    bridge::{FrameHandle, PinnedFrame},
    error::Result,
    Backend, EdgeStrategy, FrameBuffer, FrameError, FrameProcessor, FrameView, Operation,
    StrategyKind,
};
use std::{
    error::Error,
    panic::{catch_unwind, AssertUnwindSafe},
};

/// Frame handle that counts pin and release calls.
struct CountingFrame {
    data: Vec<u8>,
    fail_pin: bool,
    pins: usize,
    releases: usize,
}

impl CountingFrame {
    fn new(data: Vec<u8>) -> Self {
        CountingFrame {
            data,
            fail_pin: false,
            pins: 0,
            releases: 0,
        }
    }

    fn unpinnable(data: Vec<u8>) -> Self {
        CountingFrame {
            fail_pin: true,
            ..Self::new(data)
        }
    }
}

impl FrameHandle for CountingFrame {
    fn pin(&mut self) -> Result<()> {
        if self.fail_pin {
            return Err(FrameError::Inaccessible("storage revoked".to_owned()));
        }
        self.pins += 1;
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        assert!(self.pins > self.releases, "read while not pinned");
        &self.data
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

/// Strategy whose every call fails the way a backend or allocator would.
struct FailingStrategy {
    error: fn() -> FrameError,
}

impl EdgeStrategy for FailingStrategy {
    fn backend(&self) -> Backend {
        Backend::Simple
    }

    fn version(&self) -> &str {
        "failing"
    }

    fn grayscale(&self, _frame: &FrameView<'_>) -> Result<FrameBuffer> {
        Err((self.error)())
    }

    fn edges(&self, _frame: &FrameView<'_>) -> Result<FrameBuffer> {
        Err((self.error)())
    }
}

/// Strategy that panics mid-frame.
struct PanickingStrategy;

impl EdgeStrategy for PanickingStrategy {
    fn backend(&self) -> Backend {
        Backend::Simple
    }

    fn version(&self) -> &str {
        "panicking"
    }

    fn grayscale(&self, _frame: &FrameView<'_>) -> Result<FrameBuffer> {
        panic!("backend blew up")
    }

    fn edges(&self, _frame: &FrameView<'_>) -> Result<FrameBuffer> {
        panic!("backend blew up")
    }
}

#[test]
fn test_release_once_on_success() -> std::result::Result<(), Box<dyn Error>> {
    let processor = FrameProcessor::new(StrategyKind::Approximate);
    for op in [Operation::Edges, Operation::Grayscale] {
        let mut frame = CountingFrame::new(vec![255, 0, 0, 255, 0, 255, 0, 255]);
        let out = processor.process(Some(&mut frame), 2, 1, op)?;
        assert_eq!(out.len(), 8);
        assert_eq!(frame.pins, 1);
        assert_eq!(frame.releases, 1);
    }
    Ok(())
}

#[test]
fn test_release_once_on_backend_fault() {
    let processor = FrameProcessor::with_strategy(Box::new(FailingStrategy {
        error: || FrameError::Backend("no edges today".to_owned()),
    }));
    let mut frame = CountingFrame::new(vec![0; 16]);

    let res = processor.process(Some(&mut frame), 2, 2, Operation::Edges);
    assert!(matches!(res, Err(FrameError::Backend(_))));
    assert_eq!(frame.releases, 1);
}

#[test]
fn test_release_once_on_allocation_failure() {
    let processor = FrameProcessor::with_strategy(Box::new(FailingStrategy {
        error: || FrameError::Allocation { len: 16 },
    }));
    let mut frame = CountingFrame::new(vec![0; 16]);

    let res = processor.process(Some(&mut frame), 2, 2, Operation::Grayscale);
    assert!(matches!(res, Err(FrameError::Allocation { len: 16 })));
    assert_eq!(frame.releases, 1);
}

#[test]
fn test_release_once_on_panic() {
    let processor = FrameProcessor::with_strategy(Box::new(PanickingStrategy));
    let mut frame = CountingFrame::new(vec![0; 16]);

    let res = catch_unwind(AssertUnwindSafe(|| {
        processor.process(Some(&mut frame), 2, 2, Operation::Edges)
    }));
    assert!(res.is_err());
    assert_eq!(frame.releases, 1);
}

#[test]
fn test_pin_failure_is_not_released() {
    let processor = FrameProcessor::new(StrategyKind::Approximate);
    let mut frame = CountingFrame::unpinnable(vec![0; 16]);

    let res = processor.process(Some(&mut frame), 2, 2, Operation::Edges);
    assert!(matches!(res, Err(FrameError::Inaccessible(_))));
    assert_eq!(frame.releases, 0);
}

#[test]
fn test_missing_handle_is_null_buffer() {
    let processor = FrameProcessor::new(StrategyKind::Approximate);
    let res = processor.process::<CountingFrame>(None, 2, 2, Operation::Edges);
    assert!(matches!(res, Err(FrameError::NullBuffer)));
}

#[test]
fn test_input_is_not_modified() -> std::result::Result<(), Box<dyn Error>> {
    let source = vec![12, 34, 56, 78, 90, 12, 34, 56];
    let mut frame = CountingFrame::new(source.clone());

    for kind in [StrategyKind::Approximate, StrategyKind::Gradient] {
        let processor = FrameProcessor::new(kind);
        processor.process(Some(&mut frame), 2, 1, Operation::Edges)?;
        processor.process(Some(&mut frame), 2, 1, Operation::Grayscale)?;
    }
    assert_eq!(frame.data, source);
    assert_eq!(frame.pins, 4);
    assert_eq!(frame.releases, 4);
    Ok(())
}

#[test]
fn test_pinned_frame_guard() -> std::result::Result<(), Box<dyn Error>> {
    let mut frame = CountingFrame::new(vec![1, 2, 3, 4]);
    {
        let pinned = PinnedFrame::pin(&mut frame)?;
        assert_eq!(pinned.bytes(), &[1, 2, 3, 4]);
    }
    assert_eq!(frame.releases, 1);
    Ok(())
}

#[test]
fn test_processor_is_shareable() -> std::result::Result<(), Box<dyn Error>> {
    let processor = std::sync::Arc::new(FrameProcessor::new(StrategyKind::Approximate));
    let workers: Vec<_> = (0..4u8)
        .map(|i| {
            let processor = processor.clone();
            std::thread::spawn(move || {
                let frame = [i; 64];
                processor.to_grayscale(Some(&frame[..]), 4, 4)
            })
        })
        .collect();

    for (i, worker) in workers.into_iter().enumerate() {
        let out = worker.join().map_err(|_| "worker panicked")??;
        assert_eq!(out.len(), 64);
        assert_eq!(out.as_slice()[0], i as u8);
    }
    Ok(())
}
