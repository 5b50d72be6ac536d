use thiserror::Error;

use crate::auth::AuthFailureReason;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The stored session was already cleared and the listener notified.
    #[error("Session is no longer valid ({reason}) - please log in again")]
    SessionInvalidated {
        reason: AuthFailureReason,
        detail: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Token storage error: {0:#}")]
    Storage(anyhow::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// Map a non-success status to an error. 401s that invalidate the
    /// session are handled by the client before this is reached.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 | 422 => ApiError::Validation(truncated),
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Whether this error ended the session.
    pub fn is_session_invalidated(&self) -> bool {
        matches!(self, ApiError::SessionInvalidated { .. })
    }

    /// Short message suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SessionInvalidated { .. } => {
                "Session expired. Please log in again.".to_string()
            }
            ApiError::Unauthorized(_) => "Not authorized. Check your credentials.".to_string(),
            ApiError::RateLimited => {
                "Server is busy. Please wait a moment and try again.".to_string()
            }
            ApiError::Network(_) => "Network error. Check your connection.".to_string(),
            other => format!("Error: {}", other),
        }
    }
}
