//! Shared data models for the photocrop pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Geometry (bounding boxes, points) and aspect ratios
//! - Face detection results and options
//! - Crop suggestions (face-aware and saliency-based)
//! - Image validation, metadata and print options

pub mod analysis;
pub mod aspect;
pub mod crop;
pub mod face;
pub mod geometry;
pub mod image;

// Re-export common types
pub use analysis::ImageAnalysis;
pub use aspect::{AspectRatio, AspectRatioParseError, DEFAULT_ASPECT_RATIOS, PRINT_ASPECT_RATIO};
pub use crop::{
    CropCalculatorOptions, CropResult, CropSuggestion, SmartCropOptions, SmartCropResult,
    SmartCropSuggestion,
};
pub use face::{DetectedFace, FaceDetectionOptions, FaceDetectionResult, FaceLandmarks};
pub use geometry::{BoundingBox, Point};
pub use image::{
    ImageFormat, ImageMetadata, ImageValidation, OutputFormat, PrintOptions, PrintSize,
    ValidationCode, MAX_FILE_SIZE, SUPPORTED_MIME_TYPES,
};
