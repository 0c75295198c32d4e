//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Structured data crosses the boundary as JSON text: the host already
//! speaks JSON for configuration and state, and it keeps the C surface to a
//! single result envelope. Conversion helpers live here to keep `lib.rs`
//! focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::de::DeserializeOwned;
use serde::Serialize;

use httpreq_core::{Diagnostics, ErrorKind, HttpProvider, OperationResponse};

/// Opaque handle to a configured provider. C callers receive a pointer to
/// this and pass it back into every lifecycle call.
pub struct FfiProvider {
    pub(crate) inner: HttpProvider,
}

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    Transport = 2,
    BodyRead = 3,
    InvalidInput = 4,
    Panic = 5,
    NullArg = 6,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => FfiErrorCode::Validation,
            ErrorKind::Transport => FfiErrorCode::Transport,
            ErrorKind::BodyRead => FfiErrorCode::BodyRead,
        }
    }
}

/// Result envelope for every call.
///
/// On success `error_code` is `Ok` and `error_message` is null. `payload_json`
/// carries the new state for lifecycle calls (null after a delete or any
/// failure) or the schema for `httpreq_schema`. `diagnostics_json` is always
/// a JSON array, possibly empty, and may carry warnings even on success.
/// `status_code` mirrors the state's `status_code`, or 0 when there is none.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub status_code: i64,
    pub payload_json: *mut c_char,
    pub diagnostics_json: *mut c_char,
}

impl FfiResult {
    /// Build a result from a lifecycle hook's response.
    pub(crate) fn from_operation(response: OperationResponse) -> *mut Self {
        let status_code = response
            .state
            .as_ref()
            .and_then(|s| s.status_code)
            .unwrap_or(0);
        let payload_json = match &response.state {
            Some(state) => json_c_string(state),
            None => std::ptr::null_mut(),
        };
        let (error_code, error_message) = match response.error_kind {
            None => (FfiErrorCode::Ok, std::ptr::null_mut()),
            Some(kind) => {
                let message = response
                    .diagnostics
                    .iter()
                    .next()
                    .map(|d| format!("{}: {}", d.summary, d.detail))
                    .unwrap_or_else(|| "operation failed".to_string());
                (kind.into(), c_string(&message))
            }
        };
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            status_code,
            payload_json,
            diagnostics_json: json_c_string(&response.diagnostics),
        }))
    }

    /// Build a success result carrying an arbitrary JSON payload.
    pub(crate) fn ok_payload<T: Serialize>(payload: &T) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            status_code: 0,
            payload_json: json_c_string(payload),
            diagnostics_json: json_c_string(&Diagnostics::new()),
        }))
    }

    /// Build an error result for malformed input.
    pub(crate) fn invalid_input(summary: &str, detail: &str) -> *mut Self {
        Self::failure(FfiErrorCode::InvalidInput, summary, detail)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, "Null argument", &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, "Internal error", msg)
    }

    fn failure(error_code: FfiErrorCode, summary: &str, detail: &str) -> *mut Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(summary, detail);
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(&format!("{summary}: {detail}")),
            status_code: 0,
            payload_json: std::ptr::null_mut(),
            diagnostics_json: json_c_string(&diagnostics),
        }))
    }
}

/// Heap-allocate `s` as a C string. Interior NULs are dropped.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// Serialize `value` to a heap-allocated JSON C string. JSON output never
/// contains a raw NUL, so only a serializer failure yields `"null"`.
pub(crate) fn json_c_string<T: Serialize + ?Sized>(value: &T) -> *mut c_char {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    c_string(&json)
}

/// Read a JSON argument from C. On failure returns the error envelope to
/// hand back to the caller.
pub(crate) fn read_json<T: DeserializeOwned>(
    ptr: *const c_char,
    name: &str,
) -> Result<T, *mut FfiResult> {
    if ptr.is_null() {
        return Err(FfiResult::null_arg(name));
    }
    let raw = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| FfiResult::invalid_input(&format!("Invalid {name}"), &e.to_string()))?;
    serde_json::from_str(raw)
        .map_err(|e| FfiResult::invalid_input(&format!("Invalid {name}"), &e.to_string()))
}

/// Read an optional UTF-8 string argument; null reads as `None`.
pub(crate) fn read_optional_str<'a>(
    ptr: *const c_char,
    name: &str,
) -> Result<Option<&'a str>, *mut FfiResult> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(Some)
        .map_err(|e| FfiResult::invalid_input(&format!("Invalid {name}"), &e.to_string()))
}
