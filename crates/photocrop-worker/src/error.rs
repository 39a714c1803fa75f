//! Service error types.

use std::fmt;
use std::time::Duration;

use photocrop_media::MediaError;
use serde::Serialize;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Error code reported to callers of the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisErrorCode {
    InvalidImage,
    DetectionFailed,
    Timeout,
    Unknown,
}

impl AnalysisErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisErrorCode::InvalidImage => "INVALID_IMAGE",
            AnalysisErrorCode::DetectionFailed => "DETECTION_FAILED",
            AnalysisErrorCode::Timeout => "TIMEOUT",
            AnalysisErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AnalysisErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid image source: {0}")]
    InvalidSource(String),

    #[error("Face detection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Code reported to the caller.
    pub fn code(&self) -> AnalysisErrorCode {
        match self {
            WorkerError::InvalidSource(_) | WorkerError::Io(_) => AnalysisErrorCode::InvalidImage,
            WorkerError::Timeout(_) => AnalysisErrorCode::Timeout,
            WorkerError::Media(MediaError::InvalidAspectRatio(_)) => {
                AnalysisErrorCode::InvalidImage
            }
            WorkerError::Media(e) if e.is_validation() => AnalysisErrorCode::InvalidImage,
            WorkerError::Media(_) => AnalysisErrorCode::DetectionFailed,
            WorkerError::Config(_) => AnalysisErrorCode::Unknown,
        }
    }
}
