//! Typed failures for every component.
//!
//! Feed failures are recovered inside [`Aggregator::refresh`] and surface
//! only as warnings; repository failures are handed back to the caller.
//! Neither is ever a panic.
//!
//! [`Aggregator::refresh`]: crate::aggregator::Aggregator::refresh

use std::time::Duration;

use thiserror::Error;

/// Why a single feed source produced no items this cycle.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed feed document: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Transport(e.to_string())
    }
}

/// Why the repository listing could not be replaced this cycle.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to fetch repositories: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("repository listing is not a JSON array of objects: {0}")]
    Decode(String),

    /// One record lacked a required field, so the whole batch was rejected.
    #[error("record {index} is missing `{field}`")]
    Incomplete { index: usize, field: &'static str },
}

impl From<reqwest::Error> for RepositoryError {
    fn from(e: reqwest::Error) -> Self {
        RepositoryError::Transport(e.to_string())
    }
}

/// Rejected configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("feed source name `{0}` is configured more than once")]
    DuplicateSource(String),

    #[error("feed source #{0} has an empty name")]
    EmptyName(usize),

    #[error("`{name}` has an invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint {
        name: String,
        endpoint: String,
        reason: String,
    },

    #[error("timeout must be greater than zero")]
    InvalidTimeout,
}

/// Map a non-success [`reqwest::StatusCode`] to its code and reason phrase.
pub(crate) fn status_parts(status: reqwest::StatusCode) -> (u16, String) {
    (
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown").to_string(),
    )
}
