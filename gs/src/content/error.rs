//! Content and insight error types

use thiserror::Error;

/// Errors from the stage content provider or the insight service
///
/// None of these are fatal to a session: the controller replaces the
/// missing data with a deterministic fallback.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Content unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ContentError {
    /// Check if this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ContentError::Status { status, .. } => is_retryable_status(*status),
            ContentError::Network(_) => true,
            ContentError::InvalidResponse(_) => false,
            ContentError::Unavailable(_) => false,
            ContentError::InvalidBaseUrl(_) => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            ContentError::Status {
                status: 503,
                body: "unavailable".to_string()
            }
            .is_retryable()
        );
        assert!(
            !ContentError::Status {
                status: 404,
                body: "missing".to_string()
            }
            .is_retryable()
        );
        assert!(!ContentError::InvalidResponse("bad json".to_string()).is_retryable());
        assert!(!ContentError::Unavailable("offline".to_string()).is_retryable());
    }
}
