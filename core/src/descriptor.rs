//! The immutable, validated description of an endpoint's outbound requests.
//!
//! # Design
//! Fields are private and only reachable through getters, so a descriptor
//! cannot change after `RequestDescriptorBuilder::build` returns it. It owns
//! no network resources and is `Send + Sync`; a single instance can serve
//! any number of concurrent requests.

use std::fmt;

use serde::Serialize;

/// Stand-in for secrets in `Debug` output.
pub(crate) const REDACTED: &str = "<redacted>";

/// Basic-auth credentials scoped to one host.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub host: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("host", &self.host)
            .finish()
    }
}

/// Read-only view of a configured repository endpoint.
///
/// Produced by `RequestDescriptorBuilder::build` and consumed by
/// `FcrepoClient` on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub(crate) base_url: String,
    pub(crate) accept_type: Option<String>,
    pub(crate) content_type: Option<String>,
    #[serde(skip_serializing)]
    pub(crate) credentials: Option<Credentials>,
    pub(crate) retrieve_metadata: bool,
    pub(crate) use_tombstone: bool,
    pub(crate) throw_on_non_success: bool,
    pub(crate) transform_program: Option<String>,
    pub(crate) prefer_include: Option<String>,
    pub(crate) prefer_omit: Option<String>,
}

impl RequestDescriptor {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `Accept` header value, with spaces already replaced by `+`.
    pub fn accept_type(&self) -> Option<&str> {
        self.accept_type.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn auth_username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn auth_password(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.password.as_str())
    }

    pub fn auth_host(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.host.as_str())
    }

    /// Whether binary resources are read through their `/fcr:metadata`
    /// description.
    pub fn retrieve_metadata(&self) -> bool {
        self.retrieve_metadata
    }

    /// Whether deletes target the `/fcr:tombstone` sub-resource.
    pub fn use_tombstone(&self) -> bool {
        self.use_tombstone
    }

    /// Whether non-2xx responses are surfaced as `ApiError`.
    pub fn throw_on_non_success(&self) -> bool {
        self.throw_on_non_success
    }

    pub fn transform_program(&self) -> Option<&str> {
        self.transform_program.as_deref()
    }

    pub fn prefer_include(&self) -> Option<&str> {
        self.prefer_include.as_deref()
    }

    pub fn prefer_omit(&self) -> Option<&str> {
        self.prefer_omit.as_deref()
    }
}
