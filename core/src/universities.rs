//! The university-directory search API.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{ApiClient, InFlightCall};
use crate::request::{ApiRequest, RequestSpec};

/// One entry of the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct University {
    pub name: String,
    #[serde(default)]
    pub domains: Option<Vec<String>>,
    #[serde(default)]
    pub web_pages: Option<Vec<String>>,
    pub country: String,
}

impl University {
    /// `"<country> • <first web page>"`, or just the country.
    pub fn description(&self) -> String {
        match self.first_web_page() {
            Some(page) => format!("{} • {}", self.country, page),
            None => self.country.clone(),
        }
    }

    /// The first listed web page, if it parses as a URL.
    pub fn homepage(&self) -> Option<Url> {
        self.first_web_page().and_then(|page| Url::parse(page).ok())
    }

    fn first_web_page(&self) -> Option<&str> {
        self.web_pages.as_ref()?.first().map(String::as_str)
    }
}

/// `GET search?name=...`. The search text is lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniversityRequest {
    name: String,
}

impl UniversityRequest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ApiRequest for UniversityRequest {
    type Response = Vec<University>;

    fn spec(&self) -> RequestSpec {
        RequestSpec::get("search").with_parameter("name", self.name.as_str())
    }
}

impl ApiClient {
    /// Search the directory for universities whose name contains `name`.
    pub fn search_universities(&self, name: &str) -> InFlightCall<Vec<University>> {
        self.call(&UniversityRequest::new(name))
    }
}
