// Error types for mcmeta.
// Covers download, archive, filesystem and schema failures of the metadata source.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the metadata source.
///
/// Cloneable so one failed download can be handed to every caller that was
/// waiting on it; sources that are not `Clone` are held behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum MetaError {
    #[error("HTTP error: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unable to load {what} ({status})")]
    Status { what: String, status: StatusCode },

    #[error("JSON parsing error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    #[error("Invalid version identifier: {0:?}")]
    InvalidVersion(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for MetaError {
    fn from(err: reqwest::Error) -> Self {
        MetaError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        MetaError::Json(Arc::new(err))
    }
}

impl From<std::io::Error> for MetaError {
    fn from(err: std::io::Error) -> Self {
        MetaError::Io(Arc::new(err))
    }
}

impl From<tokio::task::JoinError> for MetaError {
    fn from(err: tokio::task::JoinError) -> Self {
        MetaError::Other(format!("background task failed: {err}"))
    }
}

impl MetaError {
    /// Whether the error means the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            MetaError::NotFound(_) => true,
            MetaError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;
