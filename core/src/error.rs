//! Error types for endpoint configuration and response interpretation.
//!
//! # Design
//! Configuration problems are reported once, synchronously, by
//! `RequestDescriptorBuilder::build` or by `EndpointOptions` parsing, and
//! always name the offending option. Response problems only arise when the
//! descriptor asks for non-2xx statuses to be surfaced as errors.

use thiserror::Error;

/// An endpoint option is missing, malformed, or inconsistent with another.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ConfigurationError {
    /// Name of the offending option (`baseUrl`, `auth`, ...).
    pub field: String,
    pub reason: String,
}

impl ConfigurationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by `FcrepoClient::parse_response` when the descriptor has
/// `throw_on_non_success` set.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The repository returned 404.
    #[error("resource not found")]
    NotFound,

    /// The repository returned 410; the resource was deleted and left a
    /// tombstone behind.
    #[error("resource gone (tombstone present)")]
    Gone,

    /// Any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_field() {
        let err = ConfigurationError::new("baseUrl", "must not be empty");
        assert_eq!(err.to_string(), "invalid `baseUrl`: must not be empty");
    }

    #[test]
    fn http_error_display_includes_status() {
        let err = ApiError::HttpError {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
