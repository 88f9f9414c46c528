//! Error types for the university search client.
//!
//! # Design
//! `ApiError` is what a caller sees as the `Err` outcome of an
//! `InFlightCall`. Resolution, transport and decode failures stay distinct
//! because they call for different reactions: fix the input, retry, or fix
//! the contract. `TransportError` is the vocabulary transports report in.

/// Errors delivered as the outcome of an `ApiClient` call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be turned into a valid absolute URL.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// The transport failed before a response was available.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The response body did not decode into the expected type.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Failures reported by a `Transport` implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    /// The transport dropped the request without reporting an outcome.
    #[error("transport abandoned the request")]
    Abandoned,

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}
