//! Assembles and validates a `RequestDescriptor`.
//!
//! # Design
//! Setters consume and return the builder so a configuration reads as one
//! chain. Nothing is validated while setting; `build` checks the base URL
//! and credential completeness in one place and reports the first problem
//! as a `ConfigurationError` naming the offending field.

use std::fmt;

use tracing::instrument;
use url::Url;

use crate::descriptor::{Credentials, REDACTED, RequestDescriptor};
use crate::error::ConfigurationError;
use crate::options::EndpointOptions;

/// Builder for `RequestDescriptor`. Owned by a single configuration-loading
/// call; not meant to be shared.
#[derive(Clone, Default)]
pub struct RequestDescriptorBuilder {
    base_url: Option<String>,
    accept_type: Option<String>,
    content_type: Option<String>,
    auth_username: Option<String>,
    auth_password: Option<String>,
    auth_host: Option<String>,
    retrieve_metadata: bool,
    use_tombstone: bool,
    throw_on_non_success: bool,
    transform_program: Option<String>,
    prefer_include: Option<String>,
    prefer_omit: Option<String>,
}

impl RequestDescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from an explicit options struct. Absent options leave
    /// the builder defaults untouched.
    pub fn from_options(options: EndpointOptions) -> Self {
        let mut builder = Self::new().accept_opt(options.accept);
        builder.base_url = options.base_url;
        builder.content_type = options.content_type.filter(|c| !c.is_empty());
        builder.auth_username = options.auth_username;
        builder.auth_password = options.auth_password;
        builder.auth_host = options.auth_host;
        builder.retrieve_metadata = options.metadata.unwrap_or_default();
        builder.use_tombstone = options.tombstone.unwrap_or_default();
        builder.throw_on_non_success = options.throw_exception_on_failure.unwrap_or_default();
        builder.transform_program = options.transform;
        builder.prefer_include = options.prefer_include;
        builder.prefer_omit = options.prefer_omit;
        builder
    }

    /// Store the raw base URL. Validated by `build`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Store an `Accept` type with every space replaced by `+`.
    ///
    /// Endpoint URIs are form-decoded, which turns `application/ld+json`
    /// into `application/ld json`; this restores the header value.
    pub fn accept(self, media_type: impl AsRef<str>) -> Self {
        self.accept_opt(Some(media_type.as_ref().to_string()))
    }

    /// Like `accept`, but `None` or an empty value leaves any earlier value
    /// in place.
    pub fn accept_opt(mut self, media_type: Option<String>) -> Self {
        if let Some(media_type) = media_type.filter(|m| !m.is_empty()) {
            self.accept_type = Some(media_type.replace(' ', "+"));
        }
        self
    }

    pub fn content_type(mut self, media_type: impl Into<String>) -> Self {
        self.content_type = Some(media_type.into());
        self
    }

    pub fn auth_username(mut self, username: impl Into<String>) -> Self {
        self.auth_username = Some(username.into());
        self
    }

    pub fn auth_password(mut self, password: impl Into<String>) -> Self {
        self.auth_password = Some(password.into());
        self
    }

    pub fn auth_host(mut self, host: impl Into<String>) -> Self {
        self.auth_host = Some(host.into());
        self
    }

    pub fn metadata(mut self, retrieve: bool) -> Self {
        self.retrieve_metadata = retrieve;
        self
    }

    pub fn tombstone(mut self, use_tombstone: bool) -> Self {
        self.use_tombstone = use_tombstone;
        self
    }

    pub fn throw_exception_on_failure(mut self, throw: bool) -> Self {
        self.throw_on_non_success = throw;
        self
    }

    pub fn transform(mut self, program: impl Into<String>) -> Self {
        self.transform_program = Some(program.into());
        self
    }

    pub fn prefer_include(mut self, uri: impl Into<String>) -> Self {
        self.prefer_include = Some(uri.into());
        self
    }

    pub fn prefer_omit(mut self, uri: impl Into<String>) -> Self {
        self.prefer_omit = Some(uri.into());
        self
    }

    /// Validate and freeze the configuration.
    #[instrument(level = "debug", skip_all)]
    pub fn build(self) -> Result<RequestDescriptor, ConfigurationError> {
        let base_url = validate_base_url(self.base_url.as_deref()).inspect_err(|e| {
            tracing::warn!(field = %e.field, reason = %e.reason, "rejected endpoint configuration");
        })?;
        let credentials = credentials(self.auth_username, self.auth_password, self.auth_host)
            .inspect_err(|e| {
                tracing::warn!(field = %e.field, reason = %e.reason, "rejected endpoint configuration");
            })?;

        tracing::debug!(
            base_url = %base_url,
            authenticated = credentials.is_some(),
            "built request descriptor"
        );

        Ok(RequestDescriptor {
            base_url,
            accept_type: self.accept_type,
            content_type: self.content_type,
            credentials,
            retrieve_metadata: self.retrieve_metadata,
            use_tombstone: self.use_tombstone,
            throw_on_non_success: self.throw_on_non_success,
            transform_program: self.transform_program,
            prefer_include: self.prefer_include,
            prefer_omit: self.prefer_omit,
        })
    }
}

impl fmt::Debug for RequestDescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptorBuilder")
            .field("base_url", &self.base_url)
            .field("accept_type", &self.accept_type)
            .field("content_type", &self.content_type)
            .field("auth_username", &self.auth_username)
            .field("auth_password", &self.auth_password.as_ref().map(|_| REDACTED))
            .field("auth_host", &self.auth_host)
            .field("retrieve_metadata", &self.retrieve_metadata)
            .field("use_tombstone", &self.use_tombstone)
            .field("throw_on_non_success", &self.throw_on_non_success)
            .field("transform_program", &self.transform_program)
            .field("prefer_include", &self.prefer_include)
            .field("prefer_omit", &self.prefer_omit)
            .finish()
    }
}

fn validate_base_url(raw: Option<&str>) -> Result<String, ConfigurationError> {
    const FIELD: &str = "baseUrl";

    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ConfigurationError::new(FIELD, "must not be empty")),
    };
    if raw.chars().any(char::is_whitespace) {
        return Err(ConfigurationError::new(FIELD, "must not contain whitespace"));
    }
    let url = Url::parse(raw).map_err(|e| ConfigurationError::new(FIELD, e.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigurationError::new(
            FIELD,
            format!("`{raw}` is not an absolute URL with a host"),
        ));
    }
    Ok(raw.to_string())
}

/// All three credential parts, or none. Empty strings count as absent.
fn credentials(
    username: Option<String>,
    password: Option<String>,
    host: Option<String>,
) -> Result<Option<Credentials>, ConfigurationError> {
    let present = |v: Option<String>| v.filter(|s| !s.is_empty());
    match (present(username), present(password), present(host)) {
        (Some(username), Some(password), Some(host)) => Ok(Some(Credentials {
            username,
            password,
            host,
        })),
        (None, None, None) => Ok(None),
        (username, password, host) => {
            let missing: Vec<&str> = [
                ("authUsername", username.is_none()),
                ("authPassword", password.is_none()),
                ("authHost", host.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, missing)| missing.then_some(name))
            .collect();
            Err(ConfigurationError::new(
                "auth",
                format!("partial credentials, missing {}", missing.join(", ")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new().base_url("http://localhost:8080/rest")
    }

    #[test]
    fn base_url_only_builds() {
        for url in [
            "http://localhost:8080/rest",
            "https://repo.example.org/fcrepo/rest/",
            "http://127.0.0.1:8080",
        ] {
            let descriptor = RequestDescriptorBuilder::new().base_url(url).build().unwrap();
            assert_eq!(descriptor.base_url(), url);
        }
    }

    #[test]
    fn missing_base_url_fails() {
        let err = RequestDescriptorBuilder::new().build().unwrap_err();
        assert_eq!(err.field, "baseUrl");
    }

    #[test]
    fn empty_base_url_fails() {
        let err = RequestDescriptorBuilder::new().base_url("").build().unwrap_err();
        assert_eq!(err.field, "baseUrl");
    }

    #[test]
    fn base_url_with_space_fails() {
        let err = RequestDescriptorBuilder::new()
            .base_url("http://localhost:8080/my rest")
            .build()
            .unwrap_err();
        assert_eq!(err.field, "baseUrl");
    }

    #[test]
    fn unparsable_base_url_fails() {
        for url in ["not a url", "localhost:8080/rest", "/rest", "mailto:someone@example.org"] {
            let err = RequestDescriptorBuilder::new().base_url(url).build().unwrap_err();
            assert_eq!(err.field, "baseUrl", "{url}");
        }
    }

    #[test]
    fn accept_replaces_spaces() {
        let descriptor = builder().accept("text/turtle; charset=utf-8").build().unwrap();
        assert_eq!(descriptor.accept_type(), Some("text/turtle;+charset=utf-8"));
    }

    #[test]
    fn second_accept_overrides_first() {
        let descriptor = builder()
            .accept("text/turtle")
            .accept("application/ld json")
            .build()
            .unwrap();
        assert_eq!(descriptor.accept_type(), Some("application/ld+json"));
    }

    #[test]
    fn debug_output_hides_password() {
        let builder = builder()
            .auth_username("fedoraAdmin")
            .auth_password("hunter2")
            .auth_host("localhost");
        let text = format!("{builder:?}");
        assert!(text.contains("fedoraAdmin"));
        assert!(!text.contains("hunter2"));

        let text = format!("{:?}", builder.build().unwrap());
        assert!(text.contains("fedoraAdmin"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn empty_accept_is_ignored() {
        let descriptor = builder().accept("text/turtle").accept("").build().unwrap();
        assert_eq!(descriptor.accept_type(), Some("text/turtle"));
    }

    #[test]
    fn absent_accept_is_noop() {
        let descriptor = builder().accept("text/turtle").accept_opt(None).build().unwrap();
        assert_eq!(descriptor.accept_type(), Some("text/turtle"));
    }

    #[test]
    fn verbatim_fields_are_not_transformed() {
        let descriptor = builder()
            .content_type("text/plain; charset=utf-8")
            .transform("default program")
            .prefer_include("http://fedora.info/definitions/v4/repository#EmbedResources")
            .prefer_omit("http://www.w3.org/ns/ldp#PreferContainment")
            .build()
            .unwrap();
        assert_eq!(descriptor.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(descriptor.transform_program(), Some("default program"));
        assert_eq!(
            descriptor.prefer_include(),
            Some("http://fedora.info/definitions/v4/repository#EmbedResources")
        );
        assert_eq!(
            descriptor.prefer_omit(),
            Some("http://www.w3.org/ns/ldp#PreferContainment")
        );
    }

    #[test]
    fn single_auth_field_fails() {
        let cases = [
            builder().auth_username("fedoraAdmin"),
            builder().auth_password("secret"),
            builder().auth_host("localhost"),
        ];
        for case in cases {
            let err = case.build().unwrap_err();
            assert_eq!(err.field, "auth");
        }
    }

    #[test]
    fn two_auth_fields_fail_naming_missing_part() {
        let err = builder()
            .auth_username("fedoraAdmin")
            .auth_password("secret")
            .build()
            .unwrap_err();
        assert_eq!(err.field, "auth");
        assert!(err.reason.contains("authHost"));
    }

    #[test]
    fn empty_auth_field_counts_as_absent() {
        let err = builder()
            .auth_username("fedoraAdmin")
            .auth_password("")
            .auth_host("localhost")
            .build()
            .unwrap_err();
        assert_eq!(err.field, "auth");

        let descriptor = builder().auth_username("").build().unwrap();
        assert!(descriptor.credentials().is_none());
    }

    #[test]
    fn full_credentials_build() {
        let descriptor = builder()
            .auth_username("fedoraAdmin")
            .auth_password("secret")
            .auth_host("localhost")
            .build()
            .unwrap();
        let credentials = descriptor.credentials().unwrap();
        assert_eq!(credentials.username, "fedoraAdmin");
        assert_eq!(credentials.password, "secret");
        assert_eq!(credentials.host, "localhost");
    }

    #[test]
    fn flags_default_to_false() {
        let descriptor = builder().build().unwrap();
        assert!(!descriptor.retrieve_metadata());
        assert!(!descriptor.use_tombstone());
        assert!(!descriptor.throw_on_non_success());
    }

    #[test]
    fn flags_are_stored() {
        let descriptor = builder()
            .metadata(true)
            .tombstone(true)
            .throw_exception_on_failure(true)
            .build()
            .unwrap();
        assert!(descriptor.retrieve_metadata());
        assert!(descriptor.use_tombstone());
        assert!(descriptor.throw_on_non_success());
    }

    #[test]
    fn ld_json_scenario() {
        let descriptor = RequestDescriptorBuilder::new()
            .base_url("http://repo.example.org/rest")
            .accept("application/ld json")
            .build()
            .unwrap();
        assert_eq!(descriptor.base_url(), "http://repo.example.org/rest");
        assert_eq!(descriptor.accept_type(), Some("application/ld+json"));
        assert_eq!(descriptor.content_type(), None);
        assert!(descriptor.credentials().is_none());
        assert_eq!(descriptor.transform_program(), None);
        assert_eq!(descriptor.prefer_include(), None);
        assert_eq!(descriptor.prefer_omit(), None);
        assert!(!descriptor.retrieve_metadata());
        assert!(!descriptor.use_tombstone());
        assert!(!descriptor.throw_on_non_success());
    }

    #[test]
    fn from_options_applies_every_field() {
        let options = EndpointOptions {
            base_url: Some("http://localhost:8080/rest".to_string()),
            accept: Some("application/ld json".to_string()),
            content_type: Some("text/turtle".to_string()),
            auth_username: Some("fedoraAdmin".to_string()),
            auth_password: Some("secret".to_string()),
            auth_host: Some("localhost".to_string()),
            metadata: Some(true),
            throw_exception_on_failure: Some(true),
            transform: Some("default".to_string()),
            tombstone: Some(true),
            prefer_include: Some("http://example.org/include".to_string()),
            prefer_omit: Some("http://example.org/omit".to_string()),
        };
        let descriptor = RequestDescriptorBuilder::from_options(options).build().unwrap();
        assert_eq!(descriptor.accept_type(), Some("application/ld+json"));
        assert_eq!(descriptor.content_type(), Some("text/turtle"));
        assert_eq!(descriptor.auth_host(), Some("localhost"));
        assert!(descriptor.retrieve_metadata());
        assert!(descriptor.use_tombstone());
        assert!(descriptor.throw_on_non_success());
        assert_eq!(descriptor.transform_program(), Some("default"));
        assert_eq!(descriptor.prefer_include(), Some("http://example.org/include"));
        assert_eq!(descriptor.prefer_omit(), Some("http://example.org/omit"));
    }

    #[test]
    fn from_default_options_fails_on_base_url() {
        let err = RequestDescriptorBuilder::from_options(EndpointOptions::default())
            .build()
            .unwrap_err();
        assert_eq!(err.field, "baseUrl");
    }
}
