//! FFI bindings for Sleepscope
//!
//! This module provides C-compatible functions for calling Sleepscope from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `sleepscope_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::encoder::BMI_DECIMALS;
use crate::pipeline::SleepPipeline;
use crate::units::{round_to, UnitConverter};

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

// ============================================================================
// Pipeline API
// ============================================================================

/// Opaque handle to a SleepPipeline
pub struct SleepPipelineHandle {
    pipeline: SleepPipeline,
}

/// Create a pipeline from a JSON model artifact.
///
/// # Safety
/// - `model_json` must be a valid null-terminated C string.
/// - Returns a pointer to a newly allocated pipeline.
/// - Must be freed with `sleepscope_pipeline_free`.
/// - Returns NULL on error; call `sleepscope_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_pipeline_new(
    model_json: *const c_char,
) -> *mut SleepPipelineHandle {
    clear_last_error();

    let model_str = match cstr_to_string(model_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid model JSON string pointer");
            return ptr::null_mut();
        }
    };

    match SleepPipeline::from_model_json(&model_str) {
        Ok(pipeline) => Box::into_raw(Box::new(SleepPipelineHandle { pipeline })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a pipeline.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `sleepscope_pipeline_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_pipeline_free(pipeline: *mut SleepPipelineHandle) {
    if !pipeline.is_null() {
        drop(Box::from_raw(pipeline));
    }
}

/// Assess one request and return the response JSON.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `sleepscope_pipeline_new`.
/// - `request_json` must be a valid null-terminated C string.
/// - A non-zero `include_report` adds the advisory report to the response.
/// - Returns a newly allocated string that must be freed with `sleepscope_free_string`.
/// - Returns NULL on error; call `sleepscope_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_assess(
    pipeline: *const SleepPipelineHandle,
    request_json: *const c_char,
    include_report: i32,
) -> *mut c_char {
    clear_last_error();

    if pipeline.is_null() {
        set_last_error("Null pipeline pointer");
        return ptr::null_mut();
    }

    let handle = &*pipeline;

    let request_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.pipeline.assess_json(&request_str, include_report != 0) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute BMI and category, returned as `{"bmi": .., "bmiCategory": ..}`.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `sleepscope_free_string`.
/// - Returns NULL on error; call `sleepscope_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_bmi(weight_kg: f64, height_cm: f64) -> *mut c_char {
    clear_last_error();

    match UnitConverter::compute_bmi(weight_kg, height_cm) {
        Ok(bmi) => {
            let json = serde_json::json!({
                "bmi": round_to(bmi.value, BMI_DECIMALS),
                "bmiCategory": bmi.category,
            });
            string_to_cstr(&json.to_string())
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Sleepscope functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Sleepscope function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Sleepscope call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Sleepscope library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sleepscope_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
