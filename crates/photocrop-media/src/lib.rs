#![deny(unreachable_patterns)]
//! Image pipeline for print products.
//!
//! This crate provides:
//! - Upload validation and header metadata
//! - Downsampling for detection
//! - Face detection with remote/heuristic providers and a content-hash cache
//! - Face-aware crop geometry and saliency-based crop suggestions
//! - Print preparation (resize, DPI metadata, format conversion, crop application)

pub mod codec;
pub mod crop_calculator;
pub mod detection;
pub mod error;
pub mod metrics;
pub mod preprocess;
pub mod print;
pub mod saliency;
pub mod smart_crop;
pub mod validate;

pub use crop_calculator::{
    adjust_crop_to_fit, calculate_average_rotation, calculate_centered_crop,
    calculate_face_crop, calculate_face_group_bounds, calculate_optimal_crop,
    is_valid_aspect_ratio, is_valid_crop_region, parse_aspect_ratio,
};
pub use detection::{
    CacheStats, DetectionCache, DetectionCacheConfig, FaceDetectionProvider, FaceDetector,
    FallbackFaceConfig, HeuristicFaceProvider, ProviderChain, ProviderImage, RemoteFaceProvider,
};
pub use error::{MediaError, MediaResult};
pub use preprocess::{preprocess, PreprocessedImage, MAX_DETECTION_DIMENSION};
pub use print::{
    apply_crop, convert_to_jpeg, get_options_for_print_size, optimize_for_print,
    DEFAULT_PRINT_QUALITY,
};
pub use saliency::{ContentAwareCropper, SaliencyConfig, SaliencyCrop, SaliencyCropper};
pub use smart_crop::{normalize_score, SmartCropAdvisor};
pub use validate::{detect_format, get_image_metadata, validate_image, validate_image_format};
