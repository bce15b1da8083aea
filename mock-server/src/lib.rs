//! In-memory Fedora-like repository used to exercise endpoint requests over
//! real HTTP.
//!
//! Resources live under `/rest`. Containers and binaries are kept in a
//! single map keyed by their path; deleting a resource removes its subtree
//! and leaves tombstones for it and every descendant that answer
//! `410 Gone` until the deleted resource's tombstone is purged through
//! `DELETE .../fcr:tombstone`.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Path prefix of every repository resource.
pub const ROOT: &str = "/rest";

const BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";
const NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";
const CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
const PREFER_CONTAINMENT: &str = "http://www.w3.org/ns/ldp#PreferContainment";
const SPARQL_UPDATE: &str = "application/sparql-update";
const TURTLE: &str = "text/turtle";
const JSON_LD: &str = "application/ld+json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Container,
    Binary,
}

#[derive(Clone, Debug)]
pub struct Resource {
    pub kind: Kind,
    pub content_type: String,
    pub content: String,
    /// RDF description of a binary, served at `/fcr:metadata`.
    pub description: String,
}

impl Resource {
    fn from_upload(content_type: Option<&str>, content: String) -> Self {
        let media_type = content_type.map(|c| c.split(';').next().unwrap_or_default().trim());
        match media_type {
            None | Some(TURTLE) => Resource {
                kind: Kind::Container,
                content_type: TURTLE.to_string(),
                content,
                description: String::new(),
            },
            Some(other) => Resource {
                kind: Kind::Binary,
                content_type: other.to_string(),
                content,
                description: String::new(),
            },
        }
    }
}

#[derive(Debug)]
pub struct Store {
    resources: HashMap<String, Resource>,
    tombstones: HashSet<String>,
}

impl Default for Store {
    fn default() -> Self {
        let root = Resource::from_upload(None, String::new());
        Self {
            resources: HashMap::from([(String::new(), root)]),
            tombstones: HashSet::new(),
        }
    }
}

impl Store {
    fn children(&self, path: &str) -> Vec<&str> {
        let mut children: Vec<&str> = self
            .resources
            .keys()
            .filter(|key| !key.is_empty() && parent(key) == path)
            .map(String::as_str)
            .collect();
        children.sort_unstable();
        children
    }
}

#[derive(Clone, Default)]
pub struct Repo {
    store: Arc<RwLock<Store>>,
    /// Expected `Authorization` header; `None` leaves the repository open.
    authorization: Option<Arc<str>>,
}

impl Repo {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        match &self.authorization {
            None => true,
            Some(expected) => headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == &**expected),
        }
    }
}

/// Addressed sub-resource of a request path.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Resource,
    Metadata,
    Tombstone,
    Transform(String),
}

/// An open repository.
pub fn app() -> Router {
    router(Repo::default())
}

/// A repository that requires basic authentication on every request.
pub fn app_with_credentials(username: &str, password: &str) -> Router {
    let token = STANDARD.encode(format!("{username}:{password}"));
    router(Repo {
        authorization: Some(format!("Basic {token}").into()),
        ..Repo::default()
    })
}

fn router(repo: Repo) -> Router {
    Router::new()
        .route(ROOT, any(dispatch))
        .route(&format!("{ROOT}/{{*path}}"), any(dispatch))
        .with_state(repo)
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn dispatch(
    State(repo): State<Repo>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !repo.authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"fcrepo\"")],
        )
            .into_response();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let base = format!("http://{host}{ROOT}");
    let raw = uri.path().strip_prefix(ROOT).unwrap_or_default().trim_matches('/');
    let (path, target) = split_target(raw);
    tracing::debug!(%method, path = %path, ?target, "repository request");

    let ctx = Ctx {
        base,
        path,
        headers,
    };
    match (method, target) {
        (Method::GET, Target::Resource) => get_resource(&repo, &ctx, false).await,
        (Method::HEAD, Target::Resource) => get_resource(&repo, &ctx, true).await,
        (Method::GET, Target::Metadata) => get_metadata(&repo, &ctx).await,
        (Method::GET, Target::Transform(program)) => get_transform(&repo, &ctx, &program).await,
        (Method::POST, Target::Resource) => create_child(&repo, &ctx, body).await,
        (Method::PUT, Target::Resource) => put_resource(&repo, &ctx, body).await,
        (Method::PATCH, target @ (Target::Resource | Target::Metadata)) => {
            patch_resource(&repo, &ctx, target, body).await
        }
        (Method::DELETE, Target::Resource) => delete_resource(&repo, &ctx).await,
        (Method::DELETE, Target::Tombstone) => purge_tombstone(&repo, &ctx).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

struct Ctx {
    base: String,
    path: String,
    headers: HeaderMap,
}

impl Ctx {
    fn url_of(&self, path: &str) -> String {
        if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{path}", self.base)
        }
    }

    fn url(&self) -> String {
        self.url_of(&self.path)
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

async fn get_resource(repo: &Repo, ctx: &Ctx, head: bool) -> Response {
    let store = repo.store.read().await;
    if store.tombstones.contains(&ctx.path) {
        return StatusCode::GONE.into_response();
    }
    let Some(resource) = store.resources.get(&ctx.path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let url = ctx.url();
    let mut headers = HeaderMap::new();
    let (content_type, body) = match resource.kind {
        Kind::Binary => {
            append(&mut headers, header::LINK, format!("<{NON_RDF_SOURCE}>; rel=\"type\""));
            append(
                &mut headers,
                header::LINK,
                format!("<{url}/fcr:metadata>; rel=\"describedby\""),
            );
            (resource.content_type.clone(), resource.content.clone())
        }
        Kind::Container => {
            append(&mut headers, header::LINK, format!("<{BASIC_CONTAINER}>; rel=\"type\""));
            let prefer = ctx.header(header::HeaderName::from_static("prefer"));
            if prefer.is_some() {
                append(
                    &mut headers,
                    header::HeaderName::from_static("preference-applied"),
                    "return=representation".to_string(),
                );
            }
            let omit_children = prefer.is_some_and(|p| p.contains(PREFER_CONTAINMENT));
            let children: Vec<String> = if omit_children {
                Vec::new()
            } else {
                store.children(&ctx.path).into_iter().map(|c| ctx.url_of(c)).collect()
            };
            let wants_json = ctx
                .header(header::ACCEPT)
                .is_some_and(|accept| accept.contains(JSON_LD));
            if wants_json {
                (JSON_LD.to_string(), container_json(&url, &children))
            } else {
                (TURTLE.to_string(), container_turtle(&url, &children, &resource.content))
            }
        }
    };
    append(&mut headers, header::CONTENT_TYPE, content_type);

    if head {
        (StatusCode::OK, headers).into_response()
    } else {
        (StatusCode::OK, headers, body).into_response()
    }
}

async fn get_metadata(repo: &Repo, ctx: &Ctx) -> Response {
    let store = repo.store.read().await;
    match store.resources.get(&ctx.path) {
        Some(resource) if resource.kind == Kind::Binary => {
            let body = format!("<{}> a <{NON_RDF_SOURCE}> .\n{}", ctx.url(), resource.description);
            (StatusCode::OK, [(header::CONTENT_TYPE, TURTLE)], body).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_transform(repo: &Repo, ctx: &Ctx, program: &str) -> Response {
    let store = repo.store.read().await;
    if !store.resources.contains_key(&ctx.path) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let body = json!([{ "id": [ctx.url()], "program": program }]);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

async fn create_child(repo: &Repo, ctx: &Ctx, body: String) -> Response {
    let mut store = repo.store.write().await;
    if store.tombstones.contains(&ctx.path) {
        return StatusCode::GONE.into_response();
    }
    match store.resources.get(&ctx.path) {
        None => return StatusCode::NOT_FOUND.into_response(),
        Some(parent) if parent.kind == Kind::Binary => {
            return StatusCode::CONFLICT.into_response()
        }
        Some(_) => {}
    }

    let id = Uuid::new_v4().to_string();
    let path = if ctx.path.is_empty() {
        id
    } else {
        format!("{}/{id}", ctx.path)
    };
    let resource = Resource::from_upload(ctx.header(header::CONTENT_TYPE), body);
    store.resources.insert(path.clone(), resource);
    created(ctx.url_of(&path))
}

async fn put_resource(repo: &Repo, ctx: &Ctx, body: String) -> Response {
    if ctx.path.is_empty() {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let mut store = repo.store.write().await;
    if store.tombstones.contains(&ctx.path) {
        return StatusCode::GONE.into_response();
    }
    let resource = Resource::from_upload(ctx.header(header::CONTENT_TYPE), body);
    match store.resources.insert(ctx.path.clone(), resource) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => created(ctx.url()),
    }
}

async fn patch_resource(repo: &Repo, ctx: &Ctx, target: Target, body: String) -> Response {
    if ctx.header(header::CONTENT_TYPE) != Some(SPARQL_UPDATE) {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }
    let mut store = repo.store.write().await;
    let Some(resource) = store.resources.get_mut(&ctx.path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match (resource.kind, target) {
        (Kind::Container, Target::Resource) => resource.content.push_str(&body),
        (Kind::Binary, Target::Metadata) => resource.description.push_str(&body),
        _ => return StatusCode::BAD_REQUEST.into_response(),
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_resource(repo: &Repo, ctx: &Ctx) -> Response {
    if ctx.path.is_empty() {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let mut store = repo.store.write().await;
    if store.resources.remove(&ctx.path).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    let prefix = format!("{}/", ctx.path);
    let descendants: Vec<String> = store
        .resources
        .keys()
        .filter(|key| key.starts_with(&prefix))
        .cloned()
        .collect();
    for path in descendants {
        store.resources.remove(&path);
        store.tombstones.insert(path);
    }
    store.tombstones.insert(ctx.path.clone());
    StatusCode::NO_CONTENT.into_response()
}

async fn purge_tombstone(repo: &Repo, ctx: &Ctx) -> Response {
    let mut store = repo.store.write().await;
    if store.tombstones.remove(&ctx.path) {
        let prefix = format!("{}/", ctx.path);
        store.tombstones.retain(|path| !path.starts_with(&prefix));
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn created(url: String) -> Response {
    let mut headers = HeaderMap::new();
    append(&mut headers, header::LOCATION, url.clone());
    append(&mut headers, header::CONTENT_TYPE, "text/plain".to_string());
    (StatusCode::CREATED, headers, url).into_response()
}

fn append(headers: &mut HeaderMap, name: header::HeaderName, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.append(name, value);
    }
}

fn split_target(raw: &str) -> (String, Target) {
    if let Some(path) = raw.strip_suffix("fcr:metadata") {
        return (path.trim_end_matches('/').to_string(), Target::Metadata);
    }
    if let Some(path) = raw.strip_suffix("fcr:tombstone") {
        return (path.trim_end_matches('/').to_string(), Target::Tombstone);
    }
    if let Some((path, program)) = raw.split_once("fcr:transform/") {
        return (
            path.trim_end_matches('/').to_string(),
            Target::Transform(program.to_string()),
        );
    }
    (raw.to_string(), Target::Resource)
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn container_turtle(url: &str, children: &[String], content: &str) -> String {
    let mut turtle = format!("<{url}> a <{BASIC_CONTAINER}> .\n");
    for child in children {
        turtle.push_str(&format!("<{url}> <{CONTAINS}> <{child}> .\n"));
    }
    turtle.push_str(content);
    turtle
}

fn container_json(url: &str, children: &[String]) -> String {
    let contains: Vec<_> = children.iter().map(|c| json!({ "@id": c })).collect();
    let mut node = json!({ "@id": url, "@type": [BASIC_CONTAINER] });
    if !contains.is_empty() {
        node[CONTAINS] = json!(contains);
    }
    json!([node]).to_string()
}
