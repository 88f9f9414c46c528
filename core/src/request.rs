//! Request descriptors and their resolution into wire requests.
//!
//! # Design
//! A `RequestSpec` knows nothing about hosts. The base endpoint is supplied
//! once, at client construction, and joined with the spec's relative path
//! every time a call is made. Resolution is a pure function and reports
//! every way it can fail as `ApiError::MalformedUrl`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpMethod, ResolvedRequest};

/// Description of one logical HTTP call, relative to a base endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub parameters: BTreeMap<String, String>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Add a query parameter. A repeated name replaces the earlier value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Join this spec onto `base` and produce the concrete request.
    ///
    /// Any query or fragment on `base` is dropped. Parameters are
    /// percent-encoded as `application/x-www-form-urlencoded` pairs.
    pub fn resolve(&self, base: &Url) -> Result<ResolvedRequest, ApiError> {
        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(ApiError::MalformedUrl(format!(
                "base endpoint `{base}` is not an absolute URL with a host"
            )));
        }
        if self.path.contains("://") || self.path.starts_with("//") {
            return Err(ApiError::MalformedUrl(format!(
                "path `{}` must be relative to the base endpoint",
                self.path
            )));
        }
        if self.path.contains(['?', '#']) {
            return Err(ApiError::MalformedUrl(format!(
                "path `{}` must not carry a query or fragment",
                self.path
            )));
        }
        if self.path.split(['/', '\\']).any(is_dot_segment) {
            return Err(ApiError::MalformedUrl(format!(
                "path `{}` must not contain `.` or `..` segments",
                self.path
            )));
        }
        if self.parameters.keys().any(|name| name.is_empty()) {
            return Err(ApiError::MalformedUrl(
                "query parameter names must not be empty".to_string(),
            ));
        }

        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.set_path(&join_path(base.path(), &self.path));
        if !self.parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(self.parameters.iter());
        }

        Ok(ResolvedRequest {
            method: self.method,
            url,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
        })
    }
}

/// Append `path` to `base` as a path component, with exactly one separator.
fn join_path(base: &str, path: &str) -> String {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), relative)
}

/// Segments that URL parsing would collapse, including percent-encoded dots.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// A request type that knows its own descriptor and response shape.
pub trait ApiRequest {
    type Response: DeserializeOwned + Send + 'static;

    fn spec(&self) -> RequestSpec;
}
