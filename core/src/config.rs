//! Client configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://universities.hipolabs.com/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings an `ApiClient` and its transport are built from.
///
/// Deserializable so a host application can embed it in its own config
/// file; `timeout_secs` is the on-disk spelling of `timeout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: Url,
    #[serde(rename = "timeout_secs", deserialize_with = "duration_from_secs")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap()
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
