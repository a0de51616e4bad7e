//! Error types for the TalentFlow API bindings.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a non-success status; `message` is the server's explanation.
    #[error("api returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("no transport handles {0}")]
    Unroutable(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server faults and dropped connections are safe to retry; validation and not-found are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => status.is_server_error(),
            ClientError::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
