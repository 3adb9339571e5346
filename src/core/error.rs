//! Failures of the remote market data API

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    #[error("HTTP error: {status} for {resource}")]
    HttpStatus { status: u16, resource: String },

    #[error("Malformed response for {resource}: {message}")]
    MalformedResponse { resource: String, message: String },
}

impl ApiError {
    pub fn network(err: &reqwest::Error) -> Self {
        ApiError::Network {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    pub fn malformed(resource: impl Into<String>, message: impl ToString) -> Self {
        ApiError::MalformedResponse {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Gateway failures and timeouts usually mean the backend model ran too long.
    pub fn is_slow_backend(&self) -> bool {
        match self {
            ApiError::Network { timed_out, .. } => *timed_out,
            ApiError::HttpStatus { status, .. } => matches!(status, 408 | 502 | 504),
            ApiError::MalformedResponse { .. } => false,
        }
    }
}
