//! C-ABI wrapper around `fcrepo-core`.
//!
//! # Overview
//! Exposes endpoint configuration and request resolution through
//! `extern "C"` functions so any language with a C FFI can configure a
//! repository endpoint, obtain request descriptions, and hand responses back
//! for interpretation without linking to Rust directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Options are applied by name (`fcrepo_builder_set_option`), matching the
//!   core's recognized configuration surface.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `fcrepo_*_free` / `fcrepo_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::catch_unwind;

use fcrepo_core::{EndpointOptions, FcrepoClient, RequestDescriptorBuilder};

use types::*;

// ---------------------------------------------------------------------------
// Builder lifecycle
// ---------------------------------------------------------------------------

/// Create a builder for an endpoint rooted at `base_url`.
///
/// `base_url` may be null; `fcrepo_builder_build` then reports the missing
/// `baseUrl`. The caller must free the returned pointer with
/// `fcrepo_builder_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_builder_new(base_url: *const c_char) -> *mut FfiBuilder {
    catch_unwind(|| {
        let options = EndpointOptions {
            base_url: unsafe { from_c(base_url) }.map(str::to_string),
            ..EndpointOptions::default()
        };
        Box::into_raw(Box::new(FfiBuilder { options }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Set one endpoint option by its recognized name (`accept`, `tombstone`,
/// `authUsername`, ...). Boolean options take `"true"` or `"false"`.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_builder_set_option(
    builder: *mut FfiBuilder,
    name: *const c_char,
    value: *const c_char,
) -> *mut FfiResult {
    catch_unwind(|| {
        if builder.is_null() {
            return FfiResult::null_arg("builder");
        }
        let Some(name) = (unsafe { from_c(name) }) else {
            return FfiResult::null_arg("name");
        };
        let Some(value) = (unsafe { from_c(value) }) else {
            return FfiResult::null_arg("value");
        };
        let builder = unsafe { &mut *builder };
        match builder.options.set(name, value) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_configuration(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("fcrepo_builder_set_option"))
}

/// Validate the configuration and create a client.
///
/// On success `*client_out` receives a client the caller must free with
/// `fcrepo_client_free`. The builder is left intact and may be reused.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_builder_build(
    builder: *const FfiBuilder,
    client_out: *mut *mut FfiClient,
) -> *mut FfiResult {
    catch_unwind(|| {
        if builder.is_null() {
            return FfiResult::null_arg("builder");
        }
        if client_out.is_null() {
            return FfiResult::null_arg("client_out");
        }
        let builder = unsafe { &*builder };
        match RequestDescriptorBuilder::from_options(builder.options.clone()).build() {
            Ok(descriptor) => {
                let client = FfiClient {
                    inner: FcrepoClient::new(descriptor),
                };
                unsafe { *client_out = Box::into_raw(Box::new(client)) };
                FfiResult::ok_empty()
            }
            Err(e) => FfiResult::from_configuration(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("fcrepo_builder_build"))
}

/// Free a builder created by `fcrepo_builder_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_builder_free(builder: *mut FfiBuilder) {
    if !builder.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(builder) });
        });
    }
}

/// Free a client created by `fcrepo_builder_build`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Run `build` against the client and path, or return null when either is
/// null or `path` is not UTF-8.
fn build_with(
    client: *const FfiClient,
    path: *const c_char,
    build: impl FnOnce(&FcrepoClient, &str) -> fcrepo_core::HttpRequest + std::panic::UnwindSafe,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(path) = (unsafe { from_c(path) }) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(build(&client.inner, path))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a GET for `path`. `binary` comes from an earlier `fcrepo_is_binary`.
///
/// Returns null if `client` or `path` is null.
/// The caller must free the returned pointer with `fcrepo_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_build_get(
    client: *const FfiClient,
    path: *const c_char,
    binary: bool,
) -> *mut FfiHttpRequest {
    build_with(client, path, |c, p| c.build_get(p, binary))
}

/// Build a HEAD for `path`.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_build_head(
    client: *const FfiClient,
    path: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, path, |c, p| c.build_head(p))
}

/// Build a DELETE for `path` (or its tombstone, per configuration).
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_build_delete(
    client: *const FfiClient,
    path: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, path, |c, p| c.build_delete(p))
}

/// Build a POST creating a child of `path`. `body` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_build_post(
    client: *const FfiClient,
    path: *const c_char,
    body: *const c_char,
) -> *mut FfiHttpRequest {
    let body = unsafe { from_c(body) };
    build_with(client, path, move |c, p| c.build_post(p, body))
}

/// Build a PUT creating or replacing `path`. `body` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_build_put(
    client: *const FfiClient,
    path: *const c_char,
    body: *const c_char,
) -> *mut FfiHttpRequest {
    let body = unsafe { from_c(body) };
    build_with(client, path, move |c, p| c.build_put(p, body))
}

/// Build a SPARQL-update PATCH for `path`.
///
/// Returns null if `client`, `path` or `sparql` is null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_build_patch(
    client: *const FfiClient,
    path: *const c_char,
    binary: bool,
    sparql: *const c_char,
) -> *mut FfiHttpRequest {
    let Some(sparql) = (unsafe { from_c(sparql) }) else {
        return std::ptr::null_mut();
    };
    build_with(client, path, move |c, p| c.build_patch(p, binary, sparql))
}

// ---------------------------------------------------------------------------
// Response functions
// ---------------------------------------------------------------------------

/// Whether a HEAD/GET response describes a binary resource. Returns false
/// for null arguments.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_is_binary(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> bool {
    catch_unwind(|| {
        if client.is_null() || response.is_null() {
            return false;
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        client.inner.is_binary(&resp.to_core())
    })
    .unwrap_or(false)
}

/// Interpret a response according to the endpoint's failure policy.
///
/// Returns a result with `data_tag = Response` on success.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_parse_response(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_response(resp.to_core()) {
            Ok(parsed) => FfiResult::ok_response(parsed),
            Err(e) => FfiResult::from_api(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("fcrepo_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `fcrepo_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c(req.url);
        free_c(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c(h.key);
                free_c(h.value);
            }
        }
    });
}

/// Free an `FfiResult` returned by any `fcrepo_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c(result.error_message);
        free_c(result.error_field);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Response => {
                    let response = unsafe { Box::from_raw(result.data as *mut FfiFcrepoResponse) };
                    free_c(response.content_type);
                    free_c(response.location);
                    free_c(response.body);
                }
                FfiDataTag::None => {}
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fcrepo_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
