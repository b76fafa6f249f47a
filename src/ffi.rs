//! FFI bindings for Pulse Insights
//!
//! This module provides C-compatible functions for calling Pulse from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `pulse_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::ServiceConfig;
use crate::error::PulseError;
use crate::pipeline::PulseService;

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

/// Run a JSON-in/JSON-out service call, recording failures in LAST_ERROR
unsafe fn call_json(
    service: *const PulseServiceHandle,
    json: *const c_char,
    f: impl FnOnce(&PulseService, &str) -> Result<String, PulseError>,
) -> *mut c_char {
    clear_last_error();

    if service.is_null() {
        set_last_error("Null service pointer");
        return ptr::null_mut();
    }

    let handle = &*service;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match f(&handle.service, &json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Service API
// ============================================================================

/// Opaque handle to a PulseService
pub struct PulseServiceHandle {
    service: PulseService,
}

/// Create a service, loading artifacts from `model_dir`.
///
/// Generative settings come from the environment. A NULL `model_dir` uses
/// `MODEL_DIR` (or the current directory).
///
/// # Safety
/// - `model_dir` must be NULL or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `pulse_service_free`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_service_new(model_dir: *const c_char) -> *mut PulseServiceHandle {
    clear_last_error();

    let mut config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    if !model_dir.is_null() {
        match cstr_to_string(model_dir) {
            Some(dir) => config = config.with_model_dir(dir),
            None => {
                set_last_error("Invalid model_dir string pointer");
                return ptr::null_mut();
            }
        }
    }

    match PulseService::from_config(&config) {
        Ok(service) => Box::into_raw(Box::new(PulseServiceHandle { service })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a PulseService.
///
/// # Safety
/// - `service` must be a valid pointer returned by `pulse_service_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_service_free(service: *mut PulseServiceHandle) {
    if !service.is_null() {
        drop(Box::from_raw(service));
    }
}

/// Score a BatchPredictRequest JSON and return a BatchPredictResponse JSON.
///
/// # Safety
/// - `service` must be a valid pointer returned by `pulse_service_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_predict_batch(
    service: *const PulseServiceHandle,
    json: *const c_char,
) -> *mut c_char {
    call_json(service, json, |svc, body| svc.predict_batch_json(body))
}

/// Turn a TeamSummary JSON into a TeamInsightsResponse JSON.
///
/// # Safety
/// - `service` must be a valid pointer returned by `pulse_service_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_team_insights(
    service: *const PulseServiceHandle,
    json: *const c_char,
) -> *mut c_char {
    call_json(service, json, |svc, body| svc.team_insights_json(body))
}

/// Health status JSON.
///
/// # Safety
/// - `service` must be a valid pointer returned by `pulse_service_new`.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
#[no_mangle]
pub unsafe extern "C" fn pulse_health(service: *const PulseServiceHandle) -> *mut c_char {
    clear_last_error();

    if service.is_null() {
        set_last_error("Null service pointer");
        return ptr::null_mut();
    }

    match (*service).service.health_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Pulse functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Pulse function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Pulse function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn pulse_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Pulse library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn pulse_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifacts::tests::write_model_dir;
    use std::ffi::CString;
    use tempfile::TempDir;

    fn model_dir() -> (TempDir, CString) {
        let dir = TempDir::new().unwrap();
        write_model_dir(dir.path(), "Low", "Stable", "Low-Potential");
        let c_dir = CString::new(dir.path().to_str().unwrap()).unwrap();
        (dir, c_dir)
    }

    #[test]
    fn test_ffi_service_lifecycle() {
        let (_dir, c_dir) = model_dir();

        unsafe {
            let service = pulse_service_new(c_dir.as_ptr());
            assert!(!service.is_null());

            let health = pulse_health(service);
            assert_eq!(CStr::from_ptr(health).to_str().unwrap(), r#"{"status":"ok"}"#);
            pulse_free_string(health);

            let request = CString::new(r#"{"employees": [{"employee_id": 1, "weeks": []}]}"#).unwrap();
            let result = pulse_predict_batch(service, request.as_ptr());
            assert!(!result.is_null());
            assert_eq!(CStr::from_ptr(result).to_str().unwrap(), r#"{"results":[]}"#);
            pulse_free_string(result);

            pulse_service_free(service);
        }
    }

    #[test]
    fn test_ffi_missing_artifacts() {
        let empty = TempDir::new().unwrap();
        let dir = CString::new(empty.path().join("models").to_str().unwrap()).unwrap();

        unsafe {
            let service = pulse_service_new(dir.as_ptr());
            assert!(service.is_null());

            let error = CStr::from_ptr(pulse_last_error()).to_str().unwrap();
            assert!(error.starts_with("Missing model file"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let (_dir, c_dir) = model_dir();

        unsafe {
            let service = pulse_service_new(c_dir.as_ptr());
            let invalid_json = CString::new("not json").unwrap();

            let result = pulse_team_insights(service, invalid_json.as_ptr());
            assert!(result.is_null());

            let error = pulse_last_error();
            assert!(!error.is_null());
            assert!(CStr::from_ptr(error)
                .to_str()
                .unwrap()
                .starts_with("Invalid request"));

            assert!(pulse_predict_batch(ptr::null(), invalid_json.as_ptr()).is_null());
            assert!(pulse_health(ptr::null()).is_null());

            pulse_service_free(service);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = pulse_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::PULSE_VERSION);
        }
    }
}
