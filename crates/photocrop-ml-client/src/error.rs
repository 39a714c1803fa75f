//! ML client error types.

use std::time::Duration;

use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("Face API not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Face API returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prediction did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Prediction {status}: {message}")]
    PredictionFailed { status: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlError {
    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::Network(_) => true,
            MlError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = MlError::HttpStatus {
            status: 429,
            body: String::new(),
        };
        let server = MlError::HttpStatus {
            status: 502,
            body: String::new(),
        };
        let bad_request = MlError::HttpStatus {
            status: 400,
            body: String::new(),
        };
        assert!(rate_limited.is_retryable());
        assert!(server.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!MlError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(!MlError::NotConfigured("token".into()).is_retryable());
    }
}
