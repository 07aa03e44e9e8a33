use std::time::Duration;

use thiserror::Error;

/// Why a single provider could not supply elements. Never leaves the source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} not found in catalog")]
    NotInCatalog(String),
    #[error("invalid TLE: {0}")]
    Invalid(String),
}
