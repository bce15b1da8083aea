//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use fcrepo_core::{ApiError, ConfigurationError, EndpointOptions, FcrepoResponse, HttpMethod};

/// Opaque handle to an endpoint configuration under construction.
pub struct FfiBuilder {
    pub(crate) options: EndpointOptions,
}

/// Opaque handle to a built `FcrepoClient`.
pub struct FfiClient {
    pub(crate) inner: fcrepo_core::FcrepoClient,
}

/// Copy a Rust string into a heap-allocated C string. Interior NULs yield
/// an empty string.
pub(crate) fn to_c(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn opt_to_c(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), |s| to_c(s))
}

/// Borrow a caller-owned C string. Null or non-UTF-8 input yields `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives
/// the returned reference.
pub(crate) unsafe fn from_c<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Release a string produced by `to_c`. Null is ignored.
pub(crate) fn free_c(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Head = 1,
    Post = 2,
    Put = 3,
    Patch = 4,
    Delete = 5,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Head => FfiHttpMethod::Head,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `fcrepo_build_*` functions. The C caller executes the request
/// and passes the response back through `fcrepo_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: fcrepo_core::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c(k),
                    value: to_c(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c(req.url),
            headers,
            headers_len,
            body: opt_to_c(req.body),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// A header supplied by the C caller; read but never freed by this library.
#[repr(C)]
pub struct FfiResponseHeader {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing an HTTP request, then
/// passes a pointer to `fcrepo_parse_response` or `fcrepo_is_binary`. The
/// FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub headers: *const FfiResponseHeader,
    pub headers_len: u32,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// Copy into a core `HttpResponse`. Null or non-UTF-8 strings become
    /// empty; headers with a null key are skipped.
    pub(crate) fn to_core(&self) -> fcrepo_core::HttpResponse {
        let headers = if self.headers.is_null() || self.headers_len == 0 {
            Vec::new()
        } else {
            let raw = unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) };
            raw.iter()
                .filter_map(|h| {
                    let key = unsafe { from_c(h.key) }?;
                    let value = unsafe { from_c(h.value) }.unwrap_or_default();
                    Some((key.to_string(), value.to_string()))
                })
                .collect()
        };
        fcrepo_core::HttpResponse {
            status: self.status,
            headers,
            body: unsafe { from_c(self.body) }.unwrap_or_default().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Configuration = 1,
    NotFound = 2,
    Gone = 3,
    Http = 4,
    Panic = 5,
    NullArg = 6,
}

/// Tag that tells `fcrepo_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Response = 1,
}

/// An interpreted repository response exposed to C. Absent values are null.
#[repr(C)]
pub struct FfiFcrepoResponse {
    pub status: u16,
    pub content_type: *mut c_char,
    pub location: *mut c_char,
    pub body: *mut c_char,
}

/// Result envelope for configuration and parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload (tagged by `data_tag`). On failure `error_code`
/// describes the category, `error_message` is a human-readable C string,
/// `error_field` names the offending option for configuration errors, and
/// `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub error_field: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiResult {
    fn new(error_code: FfiErrorCode, error_message: *mut c_char) -> Self {
        FfiResult {
            error_code,
            error_message,
            error_field: std::ptr::null_mut(),
            http_status: 0,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }
    }

    /// Build a success result with no data payload.
    pub(crate) fn ok_empty() -> *mut Self {
        Box::into_raw(Box::new(Self::new(FfiErrorCode::Ok, std::ptr::null_mut())))
    }

    /// Build a success result carrying an `FfiFcrepoResponse`.
    pub(crate) fn ok_response(response: FcrepoResponse) -> *mut Self {
        let status = response.status;
        let ffi_response = Box::new(FfiFcrepoResponse {
            status,
            content_type: opt_to_c(response.content_type),
            location: opt_to_c(response.location),
            body: to_c(response.body),
        });
        Box::into_raw(Box::new(FfiResult {
            http_status: status,
            data_tag: FfiDataTag::Response,
            data: Box::into_raw(ffi_response) as *mut std::ffi::c_void,
            ..Self::new(FfiErrorCode::Ok, std::ptr::null_mut())
        }))
    }

    /// Build an error result from a `ConfigurationError`.
    pub(crate) fn from_configuration(err: ConfigurationError) -> *mut Self {
        let message = to_c(err.to_string());
        Box::into_raw(Box::new(FfiResult {
            error_field: to_c(err.field),
            ..Self::new(FfiErrorCode::Configuration, message)
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_api(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404u16),
            ApiError::Gone => (FfiErrorCode::Gone, 410),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
        };
        Box::into_raw(Box::new(FfiResult {
            http_status,
            ..Self::new(error_code, to_c(err.to_string()))
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let message = to_c(format!("null argument: {name}"));
        Box::into_raw(Box::new(Self::new(FfiErrorCode::NullArg, message)))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(function: &str) -> *mut Self {
        tracing::error!(function, "panic caught at FFI boundary");
        let message = to_c(format!("panic in {function}"));
        Box::into_raw(Box::new(Self::new(FfiErrorCode::Panic, message)))
    }
}
