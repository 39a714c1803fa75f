//! Image analysis service for the photocrop pipeline.
//!
//! This crate provides:
//! - Environment configuration
//! - Tracing initialisation and per-request operation logging
//! - Image source loading (data URLs, HTTP, files)
//! - Combined face detection and crop suggestion with an overall timeout

pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod source;

#[cfg(test)]
mod analysis_tests;

pub use analysis::ImageAnalysisService;
pub use config::WorkerConfig;
pub use error::{AnalysisErrorCode, WorkerError, WorkerResult};
pub use logging::{init_tracing, OperationLogger};
pub use source::{decode_data_url, ImageSource, SourceLoader};
