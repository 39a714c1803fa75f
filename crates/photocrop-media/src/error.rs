//! Error types for media operations.

use photocrop_ml_client::MlError;
use photocrop_models::{AspectRatioParseError, ValidationCode};
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during image processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid image buffer: buffer is empty")]
    EmptyBuffer,

    #[error("File too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    InvalidAspectRatio(#[from] AspectRatioParseError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {format}: {message}")]
    Encode { format: &'static str, message: String },

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Face API error: {0}")]
    FaceApi(#[from] MlError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    /// Create a decode failure error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create an encode failure error.
    pub fn encode(format: &'static str, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error describes bad caller input rather than a processing failure.
    pub fn is_validation(&self) -> bool {
        self.validation_code().is_some()
    }

    /// Upload validation code for input errors.
    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            MediaError::EmptyBuffer => Some(ValidationCode::EmptyFile),
            MediaError::FileTooLarge { .. } => Some(ValidationCode::FileTooLarge),
            MediaError::UnsupportedFormat(_) => Some(ValidationCode::UnsupportedType),
            MediaError::InvalidImage(_) | MediaError::Decode(_) => {
                Some(ValidationCode::InvalidImage)
            }
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for MediaError {
    fn from(e: tokio::task::JoinError) -> Self {
        MediaError::Internal(format!("blocking task failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_codes() {
        assert_eq!(
            MediaError::EmptyBuffer.validation_code(),
            Some(ValidationCode::EmptyFile)
        );
        assert_eq!(
            MediaError::UnsupportedFormat("gif".into()).validation_code(),
            Some(ValidationCode::UnsupportedType)
        );
        assert!(!MediaError::encode("jpeg", "boom").is_validation());
    }

    #[test]
    fn test_aspect_ratio_error_message_passes_through() {
        let err: MediaError = photocrop_models::AspectRatio::parse("16")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("Expected format"));
    }
}
