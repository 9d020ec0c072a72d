// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! C ABI for foreign callers such as the camera application.
//!
//! Frames cross the boundary as a pointer and length. The input stays owned
//! by the caller and is only read during the call. Results are returned in
//! `malloc` storage that the caller owns and releases with
//! [`edgefirst_frame_free`]. Every failure, including a panic inside the
//! library, is reported as a null result; nothing unwinds into the caller.
//!
//! The strategy is fixed for the lifetime of the process: either by an
//! explicit [`edgefirst_init`] before the first frame, or from the
//! `EDGEFIRST_STRATEGY` environment variable on first use.

use crate::{
    bridge::{FrameHandle, FrameProcessor},
    error::{panic_message, FrameError, Result},
    frame::FrameBuffer,
    strategy::{Operation, StrategyKind},
};
use libc::{c_char, c_int, c_void, size_t};
use std::{
    ffi::{CStr, CString},
    panic::{catch_unwind, AssertUnwindSafe},
    ptr::{self, null_mut},
    slice::from_raw_parts,
    sync::OnceLock,
};
use tracing::{debug, error, warn};

/// Environment variable naming the strategy when `edgefirst_init` is not
/// called.
pub const STRATEGY_ENV: &str = "EDGEFIRST_STRATEGY";

/// Strategy id accepted by [`edgefirst_init`] for the approximate strategy.
pub const EDGEFIRST_STRATEGY_APPROXIMATE: c_int = 0;

/// Strategy id accepted by [`edgefirst_init`] for the gradient strategy.
pub const EDGEFIRST_STRATEGY_GRADIENT: c_int = 1;

const FALLBACK_VERSION: &CStr = c"EdgeFirst Edge";

static PROCESSOR: OnceLock<FrameProcessor> = OnceLock::new();
static VERSION: OnceLock<CString> = OnceLock::new();

fn processor() -> &'static FrameProcessor {
    PROCESSOR.get_or_init(|| {
        let kind = match std::env::var(STRATEGY_ENV) {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                warn!("ignoring {}={}: {}", STRATEGY_ENV, v, e);
                StrategyKind::default()
            }),
            Err(_) => StrategyKind::default(),
        };
        FrameProcessor::new(kind)
    })
}

/// Caller memory described by pointer and length.
struct RawFrame<'a> {
    data: *const u8,
    len: usize,
    view: &'a [u8],
}

impl RawFrame<'_> {
    /// # Safety
    ///
    /// `data` must be valid for reads of `len` bytes for as long as the
    /// frame is pinned, and must not be written to meanwhile.
    unsafe fn new(data: *const u8, len: usize) -> Self {
        RawFrame {
            data,
            len,
            view: &[],
        }
    }
}

impl FrameHandle for RawFrame<'_> {
    fn pin(&mut self) -> Result<()> {
        if self.len > isize::MAX as usize {
            return Err(FrameError::Inaccessible(format!(
                "length {} exceeds the addressable range",
                self.len
            )));
        }
        // SAFETY: non-null and in range, validity is the caller's contract
        // on RawFrame::new.
        self.view = unsafe { from_raw_parts(self.data, self.len) };
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        self.view
    }

    fn release(&mut self) {
        self.view = &[];
    }
}

/// Moves a processed frame into caller-owned `malloc` storage. The scratch
/// buffer is freed on return.
fn into_c_buffer(frame: FrameBuffer) -> Result<(*mut u8, usize)> {
    let len = frame.len();
    let out = unsafe { libc::malloc(len.max(1)) } as *mut u8;
    if out.is_null() {
        return Err(FrameError::Allocation { len });
    }
    unsafe { ptr::copy_nonoverlapping(frame.as_slice().as_ptr(), out, len) };
    Ok((out, len))
}

unsafe fn run_frame(
    data: *const u8,
    len: size_t,
    width: c_int,
    height: c_int,
    out_len: *mut size_t,
    op: Operation,
) -> *mut u8 {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut handle = if data.is_null() {
            None
        } else {
            Some(RawFrame::new(data, len))
        };
        let frame = processor().process(handle.as_mut(), width, height, op)?;
        into_c_buffer(frame)
    }));

    match result {
        Ok(Ok((out, n))) => {
            if !out_len.is_null() {
                *out_len = n;
            }
            debug!("{} returned {} bytes", op, n);
            out
        }
        Ok(Err(FrameError::Allocation { len })) => {
            error!("{}: failed to allocate {} byte result", op, len);
            null_mut()
        }
        Ok(Err(_)) => null_mut(),
        Err(payload) => {
            error!("{} panicked: {}", op, panic_message(payload.as_ref()));
            null_mut()
        }
    }
}

/// Selects the processing strategy for the rest of the process.
///
/// Returns 0 on success, `-EINVAL` for an unknown strategy id and
/// `-EALREADY` once a strategy is in place, including one chosen implicitly
/// by an earlier frame.
#[no_mangle]
pub extern "C" fn edgefirst_init(strategy: c_int) -> c_int {
    let kind = match strategy {
        EDGEFIRST_STRATEGY_APPROXIMATE => StrategyKind::Approximate,
        EDGEFIRST_STRATEGY_GRADIENT => StrategyKind::Gradient,
        _ => return -libc::EINVAL,
    };
    let result = catch_unwind(|| PROCESSOR.set(FrameProcessor::new(kind)).is_ok());
    match result {
        Ok(true) => 0,
        Ok(false) => -libc::EALREADY,
        Err(_) => -libc::EFAULT,
    }
}

/// Edge-detects an RGBA frame of `len` bytes.
///
/// Returns a new buffer of the same length, its size stored in `out_len`
/// when that is non-null, or null on failure.
///
/// # Safety
///
/// `data` must be null or valid for reads of `len` bytes for the duration
/// of the call. `out_len` must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn edgefirst_process_frame(
    data: *const u8,
    len: size_t,
    width: c_int,
    height: c_int,
    out_len: *mut size_t,
) -> *mut u8 {
    run_frame(data, len, width, height, out_len, Operation::Edges)
}

/// Converts an RGBA frame of `len` bytes to grayscale.
///
/// Same contract as [`edgefirst_process_frame`].
///
/// # Safety
///
/// See [`edgefirst_process_frame`].
#[no_mangle]
pub unsafe extern "C" fn edgefirst_to_grayscale(
    data: *const u8,
    len: size_t,
    width: c_int,
    height: c_int,
    out_len: *mut size_t,
) -> *mut u8 {
    run_frame(data, len, width, height, out_len, Operation::Grayscale)
}

/// Releases a buffer returned by this library. Null is ignored.
///
/// # Safety
///
/// `frame` must be null or a pointer returned by this library that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn edgefirst_frame_free(frame: *mut u8) {
    if !frame.is_null() {
        libc::free(frame as *mut c_void);
    }
}

/// NUL-terminated identification of the active strategy and mode.
///
/// The string is static and must not be freed. Never null.
#[no_mangle]
pub extern "C" fn edgefirst_version() -> *const c_char {
    catch_unwind(|| {
        VERSION
            .get_or_init(|| {
                CString::new(processor().version())
                    .unwrap_or_else(|_| FALLBACK_VERSION.to_owned())
            })
            .as_ptr()
    })
    .unwrap_or(FALLBACK_VERSION.as_ptr())
}
