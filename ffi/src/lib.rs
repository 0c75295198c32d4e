//! C-ABI wrapper around `httpreq-core`.
//!
//! # Overview
//! Exposes the `http_request` query and managed-resource lifecycle through
//! `extern "C"` functions so an orchestration host written in any language
//! with a C FFI can drive fetches without linking Rust directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Configuration, plans, and state are passed in as JSON strings; every
//!   call returns one `FfiResult` envelope with JSON payload and diagnostics.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `httpreq_free_*` / `httpreq_provider_free` function.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use httpreq_core::{provider, HttpModel, HttpProvider, ProviderConfig};
use tracing::Level;

use types::*;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a stderr log subscriber. `debug` selects DEBUG level instead of
/// INFO, for running under a debugger.
///
/// Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_init_logging(debug: bool) -> bool {
    catch_unwind(|| {
        let level = if debug { Level::DEBUG } else { Level::INFO };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

/// Library version as a C string. Free with `httpreq_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_version() -> *mut c_char {
    c_string(env!("CARGO_PKG_VERSION"))
}

// ---------------------------------------------------------------------------
// Provider lifecycle
// ---------------------------------------------------------------------------

/// Configure a provider from `config_json` and store it in `*out`.
///
/// A null `config_json` uses the default configuration. Unset fields fall
/// back to the environment. On failure `*out` is left null and the result
/// carries the diagnostic. Free the provider with `httpreq_provider_free`.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_provider_new(
    config_json: *const c_char,
    out: *mut *mut FfiProvider,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if out.is_null() {
            return FfiResult::null_arg("out");
        }
        unsafe { *out = std::ptr::null_mut() };

        let raw = match read_optional_str(config_json, "provider configuration") {
            Ok(raw) => raw.unwrap_or(""),
            Err(result) => return result,
        };
        let config = match ProviderConfig::from_json(raw).and_then(ProviderConfig::with_env_fallback) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "provider configuration rejected");
                return FfiResult::invalid_input("Invalid provider configuration", &e.to_string());
            }
        };

        tracing::info!(
            type_name = provider::TYPE_NAME,
            timeout_ms = ?config.request_timeout_ms,
            "provider configured"
        );
        let handle = Box::new(FfiProvider {
            inner: HttpProvider::new(config),
        });
        unsafe { *out = Box::into_raw(handle) };
        FfiResult::ok_payload(&serde_json::Value::Null)
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in httpreq_provider_new"))
}

/// Free a provider created by `httpreq_provider_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_provider_free(provider: *mut FfiProvider) {
    if !provider.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(provider) });
        }));
    }
}

/// The `http_request` attribute schema as the result payload.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_schema(provider: *const FfiProvider) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if provider.is_null() {
            return FfiResult::null_arg("provider");
        }
        let provider = unsafe { &*provider };
        FfiResult::ok_payload(&provider.inner.schema())
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in httpreq_schema"))
}

// ---------------------------------------------------------------------------
// Query primitive
// ---------------------------------------------------------------------------

/// Read the query primitive: fetch `config_json` and return the new state.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_data_source_read(
    provider: *const FfiProvider,
    config_json: *const c_char,
) -> *mut FfiResult {
    with_model(provider, config_json, "config", "httpreq_data_source_read", |p, model| {
        p.read_data_source(model)
    })
}

// ---------------------------------------------------------------------------
// Managed-resource primitive
// ---------------------------------------------------------------------------

/// Create a managed resource from `plan_json`.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_resource_create(
    provider: *const FfiProvider,
    plan_json: *const c_char,
) -> *mut FfiResult {
    with_model(provider, plan_json, "plan", "httpreq_resource_create", |p, model| {
        p.create_resource(model)
    })
}

/// Refresh a managed resource from `state_json`. Always sends `GET`.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_resource_read(
    provider: *const FfiProvider,
    state_json: *const c_char,
) -> *mut FfiResult {
    with_model(provider, state_json, "state", "httpreq_resource_read", |p, model| {
        p.read_resource(model)
    })
}

/// Accept `plan_json` as the new inputs without sending a request; computed
/// attributes are carried over from `prior_json`.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_resource_update(
    provider: *const FfiProvider,
    plan_json: *const c_char,
    prior_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if provider.is_null() {
            return FfiResult::null_arg("provider");
        }
        let provider = unsafe { &*provider };
        let plan: HttpModel = match read_json(plan_json, "plan") {
            Ok(plan) => plan,
            Err(result) => return result,
        };
        let prior: HttpModel = match read_json(prior_json, "prior state") {
            Ok(prior) => prior,
            Err(result) => return result,
        };
        FfiResult::from_operation(provider.inner.update_resource(plan, &prior))
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in httpreq_resource_update"))
}

/// Delete a managed resource. No request is sent; the payload is null.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_resource_delete(
    provider: *const FfiProvider,
    state_json: *const c_char,
) -> *mut FfiResult {
    with_model(provider, state_json, "state", "httpreq_resource_delete", |p, model| {
        p.delete_resource(&model)
    })
}

fn with_model<F>(
    provider: *const FfiProvider,
    json: *const c_char,
    name: &str,
    call: &str,
    hook: F,
) -> *mut FfiResult
where
    F: FnOnce(&HttpProvider, HttpModel) -> httpreq_core::OperationResponse,
{
    catch_unwind(AssertUnwindSafe(|| {
        if provider.is_null() {
            return FfiResult::null_arg("provider");
        }
        let provider = unsafe { &*provider };
        let model: HttpModel = match read_json(json, name) {
            Ok(model) => model,
            Err(result) => return result,
        };
        FfiResult::from_operation(hook(&provider.inner, model))
    }))
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in {call}")))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiResult` returned by any `httpreq_*` call. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        for ptr in [result.error_message, result.payload_json, result.diagnostics_json] {
            if !ptr.is_null() {
                drop(unsafe { CString::from_raw(ptr) });
            }
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpreq_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { CString::from_raw(s) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
