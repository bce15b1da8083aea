//! The recognized endpoint configuration surface.
//!
//! # Design
//! `EndpointOptions` is the explicit configuration struct an application
//! fills from its own configuration source and hands to
//! `RequestDescriptorBuilder::from_options` by value. Three sources are
//! supported: a JSON document, individual `name = value` pairs, and a
//! routing-style endpoint URI such as
//! `fcrepo:localhost:8080/rest?accept=application/ld+json&tombstone=true`.

use serde::Deserialize;

use crate::error::ConfigurationError;

/// Scheme prefix of routing-style endpoint URIs.
pub const ENDPOINT_SCHEME: &str = "fcrepo:";

/// Every option name accepted by `EndpointOptions::set`.
pub const OPTION_NAMES: [&str; 12] = [
    "baseUrl",
    "accept",
    "contentType",
    "authUsername",
    "authPassword",
    "authHost",
    "metadata",
    "throwExceptionOnFailure",
    "transform",
    "tombstone",
    "preferInclude",
    "preferOmit",
];

/// Endpoint options keyed by their recognized names. Every option is
/// optional; unset booleans become `false` in the built descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndpointOptions {
    pub base_url: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub auth_host: Option<String>,
    pub metadata: Option<bool>,
    pub throw_exception_on_failure: Option<bool>,
    pub transform: Option<String>,
    pub tombstone: Option<bool>,
    pub prefer_include: Option<String>,
    pub prefer_omit: Option<String>,
}

impl EndpointOptions {
    /// Load options from a JSON object with camelCase keys.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::new("options", e.to_string()))
    }

    /// Parse a routing-style endpoint URI.
    ///
    /// The part after `fcrepo:` up to `?` is the base URL (`http://` is
    /// assumed when it carries no scheme). The query string is
    /// form-decoded and each pair applied through `set`.
    pub fn from_endpoint_uri(uri: &str) -> Result<Self, ConfigurationError> {
        let remaining = uri.strip_prefix(ENDPOINT_SCHEME).ok_or_else(|| {
            ConfigurationError::new("endpointUri", format!("expected `{ENDPOINT_SCHEME}` scheme"))
        })?;
        let remaining = remaining.trim_start_matches('/');
        let (location, query) = match remaining.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (remaining, None),
        };

        let mut options = Self::default();
        if !location.is_empty() {
            options.base_url = Some(if location.contains("://") {
                location.to_string()
            } else {
                format!("http://{location}")
            });
        }
        if let Some(query) = query {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                options.set(&name, &value)?;
            }
        }
        Ok(options)
    }

    /// Apply a single option by name. Booleans accept `true`/`false` in any
    /// case; an empty text value clears the option.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        let text = (!value.is_empty()).then(|| value.to_string());
        match name {
            "baseUrl" => self.base_url = text,
            "accept" => self.accept = text,
            "contentType" => self.content_type = text,
            "authUsername" => self.auth_username = text,
            "authPassword" => self.auth_password = text,
            "authHost" => self.auth_host = text,
            "metadata" => self.metadata = Some(parse_flag(name, value)?),
            "throwExceptionOnFailure" => {
                self.throw_exception_on_failure = Some(parse_flag(name, value)?)
            }
            "transform" => self.transform = text,
            "tombstone" => self.tombstone = Some(parse_flag(name, value)?),
            "preferInclude" => self.prefer_include = text,
            "preferOmit" => self.prefer_omit = text,
            _ => return Err(ConfigurationError::new(name, "unrecognized option")),
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigurationError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigurationError::new(
            name,
            format!("expected `true` or `false`, got `{value}`"),
        ))
    }
}
