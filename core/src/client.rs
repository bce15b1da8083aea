//! Stateless request resolver for a configured repository endpoint.
//!
//! # Design
//! `FcrepoClient` holds only a `RequestDescriptor` and carries no mutable
//! state between calls. Each repository operation has a `build_*` method
//! that turns a resource path into an `HttpRequest`; `parse_response`
//! interprets the `HttpResponse` the host got back. The host executes the
//! actual HTTP round-trip, keeping the core deterministic and free of I/O.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::{Host, Url};

use crate::descriptor::RequestDescriptor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Sub-resource describing a binary (non-RDF) resource.
pub const METADATA: &str = "fcr:metadata";
/// Sub-resource left behind when a resource is deleted.
pub const TOMBSTONE: &str = "fcr:tombstone";
/// Sub-resource serving a named server-side transform of a resource.
pub const TRANSFORM: &str = "fcr:transform";

const NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";
const SPARQL_UPDATE: &str = "application/sparql-update";
const JSON: &str = "application/json";

/// Interpreted repository response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcrepoResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// `Location` of a newly created resource, when the repository sent one.
    pub location: Option<String>,
    pub body: String,
}

/// Resolves repository operations against one endpoint configuration.
#[derive(Debug, Clone)]
pub struct FcrepoClient {
    descriptor: RequestDescriptor,
}

impl FcrepoClient {
    pub fn new(descriptor: RequestDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Absolute URL of `path` under the base URL. Absolute `http(s)` paths,
    /// such as a `Location` returned by the repository, are used as-is.
    pub fn resource_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.trim_end_matches('/').to_string();
        }
        let base = self.descriptor.base_url().trim_end_matches('/');
        let path = path.trim_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Read a resource. A configured transform wins over metadata
    /// resolution; `binary` comes from an earlier `is_binary` check.
    pub fn build_get(&self, path: &str, binary: bool) -> HttpRequest {
        let d = &self.descriptor;
        let mut url = self.resource_url(path);
        let mut accept = d.accept_type().map(str::to_string);

        if let Some(program) = d.transform_program() {
            url = append_segments(url, &[TRANSFORM, program]);
            accept.get_or_insert_with(|| JSON.to_string());
        } else if binary && d.retrieve_metadata() {
            url = format!("{url}/{METADATA}");
        }

        let mut headers = Vec::new();
        if let Some(accept) = accept {
            headers.push(("accept".to_string(), accept));
        }
        if let Some(prefer) = self.prefer_header() {
            headers.push(("prefer".to_string(), prefer));
        }
        self.request(HttpMethod::Get, url, headers, None)
    }

    pub fn build_head(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Head, self.resource_url(path), Vec::new(), None)
    }

    /// Delete a resource, or purge its tombstone when `use_tombstone` is set.
    pub fn build_delete(&self, path: &str) -> HttpRequest {
        let mut url = self.resource_url(path);
        if self.descriptor.use_tombstone() {
            url = format!("{url}/{TOMBSTONE}");
        }
        self.request(HttpMethod::Delete, url, Vec::new(), None)
    }

    /// Create a child of the container at `path`.
    pub fn build_post(&self, path: &str, body: Option<&str>) -> HttpRequest {
        self.build_write(HttpMethod::Post, path, body)
    }

    /// Create or replace the resource at `path`.
    pub fn build_put(&self, path: &str, body: Option<&str>) -> HttpRequest {
        self.build_write(HttpMethod::Put, path, body)
    }

    /// Apply a SPARQL update. For binaries the update goes to the
    /// description when `retrieve_metadata` is set.
    pub fn build_patch(&self, path: &str, binary: bool, sparql: &str) -> HttpRequest {
        let mut url = self.resource_url(path);
        if binary && self.descriptor.retrieve_metadata() {
            url = format!("{url}/{METADATA}");
        }
        let headers = vec![("content-type".to_string(), SPARQL_UPDATE.to_string())];
        self.request(HttpMethod::Patch, url, headers, Some(sparql.to_string()))
    }

    /// Whether a HEAD/GET response describes a binary (LDP-NR) resource.
    pub fn is_binary(&self, response: &HttpResponse) -> bool {
        response
            .header_values("link")
            .flat_map(|value| value.split(','))
            .filter_map(parse_link)
            .any(|(target, rel)| rel == "type" && target == NON_RDF_SOURCE)
    }

    /// Interpret a response. Non-2xx statuses become errors only when the
    /// descriptor asks for it; otherwise they are returned as data.
    pub fn parse_response(&self, response: HttpResponse) -> Result<FcrepoResponse, ApiError> {
        if self.descriptor.throw_on_non_success() {
            check_status(&response)?;
        }
        Ok(FcrepoResponse {
            status: response.status,
            content_type: response.header("content-type").map(str::to_string),
            location: response.header("location").map(str::to_string),
            body: response.body,
        })
    }

    fn build_write(&self, method: HttpMethod, path: &str, body: Option<&str>) -> HttpRequest {
        let mut headers = Vec::new();
        if let (Some(content_type), Some(_)) = (self.descriptor.content_type(), body) {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }
        self.request(method, self.resource_url(path), headers, body.map(str::to_string))
    }

    fn request(
        &self,
        method: HttpMethod,
        url: String,
        mut headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> HttpRequest {
        if let Some(authorization) = self.authorization(&url) {
            headers.push(("authorization".to_string(), authorization));
        }
        tracing::debug!(method = method.as_str(), url = %url, "resolved repository request");
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// `return=representation` with the configured include/omit URIs, or
    /// `None` when neither is set.
    fn prefer_header(&self) -> Option<String> {
        let d = &self.descriptor;
        if d.prefer_include().is_none() && d.prefer_omit().is_none() {
            return None;
        }
        let mut prefer = "return=representation".to_string();
        if let Some(include) = d.prefer_include() {
            prefer.push_str(&format!("; include=\"{include}\""));
        }
        if let Some(omit) = d.prefer_omit() {
            prefer.push_str(&format!("; omit=\"{omit}\""));
        }
        Some(prefer)
    }

    /// Basic credentials, sent only to the configured host.
    fn authorization(&self, url: &str) -> Option<String> {
        let credentials = self.descriptor.credentials()?;
        let target = Url::parse(url).ok()?;
        if target.host()?.to_owned() != parse_auth_host(&credentials.host)? {
            return None;
        }
        let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
        Some(format!("Basic {token}"))
    }
}

/// Host part of an `authHost` value, without any `:port`. IPv6 literals
/// may be written with or without brackets. Domains come back lowercased.
fn parse_auth_host(auth_host: &str) -> Option<Host> {
    let host = if let Some(rest) = auth_host.strip_prefix('[') {
        let (ip, _port) = rest.split_once(']')?;
        format!("[{ip}]")
    } else if auth_host.matches(':').count() > 1 {
        format!("[{auth_host}]")
    } else {
        auth_host.split(':').next().unwrap_or_default().to_string()
    };
    Host::parse(&host).ok()
}

/// Append percent-encoded path segments to `url`.
fn append_segments(url: String, segments: &[&str]) -> String {
    let Ok(mut parsed) = Url::parse(&url) else {
        return format!("{url}/{}", segments.join("/"));
    };
    if let Ok(mut path) = parsed.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    parsed.into()
}

/// Split one `<target>; rel="name"` link into its target and relation.
fn parse_link(link: &str) -> Option<(&str, &str)> {
    let mut parts = link.split(';').map(str::trim);
    let target = parts.next()?.strip_prefix('<')?.strip_suffix('>')?;
    let rel = parts
        .filter_map(|param| param.strip_prefix("rel="))
        .map(|rel| rel.trim_matches('"'))
        .next()?;
    Some((target, rel))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        404 => Err(ApiError::NotFound),
        410 => Err(ApiError::Gone),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
