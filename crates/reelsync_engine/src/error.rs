use std::time::Duration;

use thiserror::Error;

/// Failure of a call into an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("subscription {0} not found")]
    NotFound(String),
    #[error("discovery process failed: {0}")]
    Process(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl CollaboratorError {
    /// Classifies a failed request made by a client whose per-request limit
    /// is `limit`.
    pub(crate) fn from_transport(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            return CollaboratorError::Timeout(limit);
        }
        if let Some(status) = err.status() {
            return CollaboratorError::HttpStatus(status.as_u16());
        }
        CollaboratorError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::Decode(err.to_string())
    }
}
