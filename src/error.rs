//! Error taxonomy for the remote task API.
//!
//! Every HTTP response is classified exactly once (in [`crate::remote`])
//! into one of three kinds:
//! - [`ApiError::Unauthorized`] — the credential was rejected. Callers route
//!   this to `SessionManager::expire` instead of surfacing it per-operation.
//! - [`ApiError::Status`] — any other non-success status, carrying the
//!   server's human-readable message when one was provided.
//! - [`ApiError::Transport`] — the request never produced a usable response
//!   (connection refused, timeout, body decode failure).

use thiserror::Error;

/// Failure of a single remote API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the bearer credential (HTTP 401). Interpreted
    /// uniformly as "session no longer valid" regardless of cause.
    #[error("session is no longer valid")]
    Unauthorized,

    /// Non-auth HTTP failure with the server's error message.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, timeout, or response decoding failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether this failure means the session credential is invalid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_flagged() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        let status = ApiError::Status {
            status: 500,
            message: "boom".into(),
        };
        assert!(!status.is_unauthorized());
    }

    #[test]
    fn status_display_includes_message() {
        let err = ApiError::Status {
            status: 422,
            message: "title required".into(),
        };
        assert_eq!(err.to_string(), "server returned 422: title required");
    }
}
