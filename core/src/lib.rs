//! Typed, cancellable client for the university-directory HTTP API.
//!
//! # Overview
//! A `RequestSpec` describes a call relative to a base endpoint. The
//! `ApiClient` resolves it, runs it through an injected `Transport`, and
//! decodes the JSON body into the caller's type. Each call is an
//! `InFlightCall` future that yields one value or one `ApiError`, and can
//! be cancelled at any point before it does.
//!
//! # Design
//! - The transport is always passed in. `UreqTransport` is the production
//!   implementation; tests substitute doubles that complete synchronously.
//! - Resolution is pure and fallible. Bad input becomes
//!   `ApiError::MalformedUrl` delivered through the call, never a panic.
//! - No retries, no caching: every call goes to the network.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod universities;

pub use client::{ApiClient, InFlightCall};
pub use config::ClientConfig;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, ResolvedRequest, TransportResponse};
pub use request::{ApiRequest, RequestSpec};
pub use transport::{Completion, Transport, TransportTask, UreqTransport};
pub use universities::{University, UniversityRequest};
