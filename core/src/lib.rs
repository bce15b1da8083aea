//! Endpoint configuration core for a Fedora Commons (Fcrepo) repository
//! client.
//!
//! # Overview
//! An endpoint is configured once, from an `EndpointOptions` struct or by
//! chaining `RequestDescriptorBuilder` setters, and frozen into an immutable
//! `RequestDescriptor`. `FcrepoClient` resolves repository operations
//! against that descriptor into `HttpRequest` values and interprets the
//! `HttpResponse` values the host hands back (host-does-IO pattern).
//!
//! # Design
//! - Configuration errors are synchronous `ConfigurationError`s naming the
//!   offending option; nothing is validated until `build`.
//! - The descriptor and client are immutable and `Send + Sync`.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod builder;
pub mod client;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod options;

pub use builder::RequestDescriptorBuilder;
pub use client::{FcrepoClient, FcrepoResponse};
pub use descriptor::{Credentials, RequestDescriptor};
pub use error::{ApiError, ConfigurationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::EndpointOptions;
