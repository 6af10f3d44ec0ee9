//! Client errors
//!
//! Transport failures, bodies that do not decode, and non-2xx answers from the
//! server. Callers branch on the answer's class through the `is_*` helpers
//! rather than matching on status codes.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection broke
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server answered {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// The body of a successful answer did not have the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The request could not be built, e.g. a malformed server URL
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn api(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Status of the server's answer, if there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// The API key was missing or rejected
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The server is up but refuses new work, typically while shutting down
    pub fn is_unavailable(&self) -> bool {
        self.status() == Some(StatusCode::SERVICE_UNAVAILABLE)
    }

    /// No connection to the server could be made
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect() || e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let not_found = ClientError::api(StatusCode::NOT_FOUND, "job not found: x");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_unauthorized());
        assert_eq!(not_found.to_string(), "server answered 404 Not Found: job not found: x");

        let unavailable = ClientError::api(StatusCode::SERVICE_UNAVAILABLE, "engine is shutting down");
        assert!(unavailable.is_unavailable());
        assert!(!unavailable.is_not_found());
        assert!(!unavailable.is_unreachable());

        let denied = ClientError::api(StatusCode::UNAUTHORIZED, "missing API key");
        assert!(denied.is_unauthorized());
    }

    #[test]
    fn test_errors_without_a_status() {
        let invalid = ClientError::InvalidRequest("bad url".to_string());
        assert_eq!(invalid.status(), None);
        assert!(!invalid.is_not_found());
        assert!(!ClientError::Decode("eof".to_string()).is_unreachable());
    }
}
