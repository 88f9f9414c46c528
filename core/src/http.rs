//! HTTP value types shared by the request builder and the transports.
//!
//! # Design
//! Requests and responses are plain data. `RequestSpec::resolve` produces a
//! `ResolvedRequest`, a `Transport` executes it and reports a
//! `TransportResponse`. Nothing here performs I/O.

use std::fmt;

use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete wire request: method, absolute URL and headers.
///
/// Built fresh for every call by `RequestSpec::resolve` and handed to a
/// `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl ResolvedRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What a transport hands back when the exchange did not fail at the
/// transport level.
///
/// Every field is optional in the sense that a transport may not know it:
/// `status` is `None` for non-HTTP doubles and `body` is `None` when the
/// server sent nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransportResponse {
    /// A response carrying only a body, as a canned double would return.
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: None,
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }
}
