//! Error types shared across the crawl pipeline.
//!
//! Three kinds of failure are distinguished:
//!
//! - [`GatewayError`] for remote service failures that survived the retry
//!   policy of the gateway (the remote-service error kind)
//! - [`StoreError`] for local cache and state persistence failures, which are
//!   always treated as soft failures by the crawl
//! - [`ConfigError`] for invalid or missing configuration values
//!
//! [`ApiError`] is the raw outcome of a single HTTP request before the gateway
//! decides whether it is transient.

use thiserror::Error;

/// Outcome of a single failed request against the Spotify Web API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("server error ({0})")]
    Server(u16),

    #[error("request failed with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cannot decode response: {0}")]
    Decode(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Non-transient remote failure returned by the gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("remote call failed with status {0}")]
    Fatal(u16),

    #[error("remote call failed: {0}")]
    Transport(String),

    #[error("unexpected remote response: {0}")]
    Decode(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Remote(#[from] GatewayError),

    #[error("empty result: {0}")]
    EmptyResult(&'static str),

    #[error("crawler is not booting")]
    NotBooting,
}

impl From<ApiError> for GatewayError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited { .. } => GatewayError::Fatal(429),
            ApiError::Server(status) | ApiError::Status(status) => GatewayError::Fatal(status),
            ApiError::Transport(msg) => GatewayError::Transport(msg),
            ApiError::Decode(msg) => GatewayError::Decode(msg),
            ApiError::Unauthorized(msg) => GatewayError::Unauthorized(msg),
        }
    }
}
