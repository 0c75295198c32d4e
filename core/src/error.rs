//! Error types for the fetch pipeline.
//!
//! # Design
//! No failure terminates the process: each one is a variant here and flows
//! back to the caller as a `Result`. `ErrorKind`
//! groups the variants into the three classes the host reports on:
//! validation (nothing was sent), transport (the exchange failed), and body
//! read (the exchange started but the body could not be drained).

use std::time::Duration;

use thiserror::Error;

/// Errors returned by `FetchOperation` and `Fetcher` implementations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("url must not be empty")]
    EmptyUrl,

    #[error("unsupported HTTP method {method:?}, expected one of GET, HEAD, POST")]
    InvalidMethod { method: String },

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to read response body: {0}")]
    BodyRead(#[source] std::io::Error),
}

/// Failure class of a `FetchError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    BodyRead,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::EmptyUrl | FetchError::InvalidMethod { .. } => ErrorKind::Validation,
            FetchError::InvalidUrl { .. }
            | FetchError::InvalidHeader { .. }
            | FetchError::Timeout { .. }
            | FetchError::Transport { .. } => ErrorKind::Transport,
            FetchError::BodyRead(_) => ErrorKind::BodyRead,
        }
    }
}

/// Errors raised while loading provider configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed provider configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {name}: expected milliseconds as an integer")]
    InvalidTimeout { name: String, value: String },
}
