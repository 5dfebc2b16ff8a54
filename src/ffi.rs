//! FFI bindings for Ocusense
//!
//! This module provides C-compatible functions for driving the engine from a
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `ocusense_free_string`.
//!
//! The host is expected to check tracking availability itself before
//! constructing an engine; the handle created here uses an always-available
//! capability and relies on the host to bracket sessions correctly.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::Utc;

use crate::capability::{AlwaysAvailable, FrameSink};
use crate::error::EngineError;
use crate::report::ReportEncoder;
use crate::session::SessionController;
use crate::types::{DurationPreset, FrameSample};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Opaque handle to a SessionController and its report encoder
pub struct EngineHandle {
    controller: SessionController,
    encoder: ReportEncoder,
}

/// Create a new engine with default configuration.
///
/// # Safety
/// - Returns a pointer to a newly allocated engine.
/// - Must be freed with `ocusense_engine_free`.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_new() -> *mut EngineHandle {
    clear_last_error();

    let handle = Box::new(EngineHandle {
        controller: SessionController::new(Box::new(AlwaysAvailable)),
        encoder: ReportEncoder::new(),
    });
    Box::into_raw(handle)
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_free(engine: *mut EngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Select the exercise duration in seconds (must match a supported preset).
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_configure_duration(
    engine: *mut EngineHandle,
    seconds: u32,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    let preset = match DurationPreset::try_from_seconds(seconds) {
        Some(preset) => preset,
        None => {
            set_last_error(&EngineError::InvalidDuration(seconds).to_string());
            return -1;
        }
    };

    (*engine).controller.configure_duration(preset);
    0
}

/// Start an exercise session.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - Returns 0 on success, non-zero on error (call `ocusense_last_error`).
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_start(engine: *mut EngineHandle) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    match (*engine).controller.start() {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Stop the running session, if any. Stopping an already-stopped engine is a
/// no-op.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - Returns 1 when a session was recorded, 0 on a no-op, negative on error.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_stop(engine: *mut EngineHandle) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    match (*engine).controller.stop(Utc::now()) {
        Some(_) => 1,
        None => 0,
    }
}

/// Advance the countdown by one second. The host calls this from its
/// 1-second timer while a session is running.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - Returns the remaining seconds after the tick, or negative on error.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_tick(engine: *mut EngineHandle) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    let controller = &mut (*engine).controller;
    controller.tick(Utc::now());
    controller.snapshot().remaining_sec as i32
}

/// Ingest one frame sample encoded as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error (call `ocusense_last_error`).
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_ingest_sample_json(
    engine: *mut EngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    let sample: FrameSample = match serde_json::from_str(&json_str) {
        Ok(sample) => sample,
        Err(e) => {
            set_last_error(&EngineError::ParseError(e.to_string()).to_string());
            return -1;
        }
    };

    (*engine).controller.on_frame_sample(sample);
    0
}

/// Get the current published state as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - Returns a newly allocated string that must be freed with
///   `ocusense_free_string`.
/// - Returns NULL on error; call `ocusense_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_snapshot_json(engine: *mut EngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let snapshot = (*engine).controller.snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the full session report (snapshot, logs, history, findings) as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `ocusense_engine_new`.
/// - Returns a newly allocated string that must be freed with
///   `ocusense_free_string`.
/// - Returns NULL on error; call `ocusense_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn ocusense_engine_report_json(engine: *mut EngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &*engine;
    match handle.encoder.encode_to_json(&handle.controller, Utc::now()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the last error message, or NULL if there was none.
///
/// # Safety
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
#[no_mangle]
pub unsafe extern "C" fn ocusense_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string returned by this API.
///
/// # Safety
/// - `s` must be a pointer returned by an `ocusense_*` function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn ocusense_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
