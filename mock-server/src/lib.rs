use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct University {
    pub name: String,
    pub domains: Vec<String>,
    pub web_pages: Vec<String>,
    pub country: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub country: Option<String>,
}

pub type Directory = Arc<Vec<University>>;

fn university(name: &str, domain: &str, web_page: &str, country: &str) -> University {
    University {
        name: name.to_string(),
        domains: vec![domain.to_string()],
        web_pages: vec![web_page.to_string()],
        country: country.to_string(),
    }
}

/// A small fixed subset of the public directory.
pub fn seed() -> Vec<University> {
    vec![
        university(
            "Massachusetts Institute of Technology",
            "mit.edu",
            "http://web.mit.edu/",
            "United States",
        ),
        university(
            "Stanford University",
            "stanford.edu",
            "http://www.stanford.edu/",
            "United States",
        ),
        university(
            "University of Oxford",
            "ox.ac.uk",
            "http://www.ox.ac.uk/",
            "United Kingdom",
        ),
        university(
            "University of Cambridge",
            "cam.ac.uk",
            "http://www.cam.ac.uk/",
            "United Kingdom",
        ),
        university(
            "Technical University of Munich",
            "tum.de",
            "http://www.tum.de/",
            "Germany",
        ),
    ]
}

pub fn app() -> Router {
    app_with(seed())
}

pub fn app_with(universities: Vec<University>) -> Router {
    let directory: Directory = Arc::new(universities);
    Router::new()
        .route("/search", get(search))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(directory)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Case-insensitive substring match on the name, exact match on the country.
pub fn matches(university: &University, params: &SearchParams) -> bool {
    let name_ok = params.name.as_deref().map_or(true, |needle| {
        university
            .name
            .to_lowercase()
            .contains(&needle.to_lowercase())
    });
    let country_ok = params
        .country
        .as_deref()
        .map_or(true, |country| university.country.eq_ignore_ascii_case(country));
    name_ok && country_ok
}

async fn search(
    State(directory): State<Directory>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<University>> {
    let found: Vec<University> = directory
        .iter()
        .filter(|u| matches(u, &params))
        .cloned()
        .collect();
    tracing::debug!(
        name = ?params.name,
        country = ?params.country,
        results = found.len(),
        "search"
    );
    Json(found)
}

async fn health() -> &'static str {
    "ok"
}
