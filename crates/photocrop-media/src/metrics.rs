//! Metrics for the image pipeline.
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the embedding process.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const DETECTIONS_TOTAL: &str = "photocrop_face_detections_total";
    pub const DETECTION_DURATION_SECONDS: &str = "photocrop_face_detection_duration_seconds";
    pub const FACES_DETECTED: &str = "photocrop_faces_detected";
    pub const CACHE_HITS_TOTAL: &str = "photocrop_detection_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "photocrop_detection_cache_misses_total";
    pub const PROVIDER_FALLBACKS_TOTAL: &str = "photocrop_provider_fallbacks_total";
    pub const PRINT_OPTIMIZE_DURATION_SECONDS: &str = "photocrop_print_optimize_duration_seconds";
}

/// Record a completed (uncached) detection.
pub fn record_detection(provider: &str, faces: usize, duration_secs: f64) {
    let labels = [("provider", provider.to_string())];
    counter!(names::DETECTIONS_TOTAL, &labels).increment(1);
    histogram!(names::DETECTION_DURATION_SECONDS, &labels).record(duration_secs);
    histogram!(names::FACES_DETECTED, &labels).record(faces as f64);
}

pub fn record_cache_hit() {
    counter!(names::CACHE_HITS_TOTAL).increment(1);
}

pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}

/// Record a switch from the primary provider to the fallback.
pub fn record_provider_fallback(from: &str, to: &str) {
    let labels = [("from", from.to_string()), ("to", to.to_string())];
    counter!(names::PROVIDER_FALLBACKS_TOTAL, &labels).increment(1);
}

pub fn record_print_optimize(format: &str, duration_secs: f64) {
    let labels = [("format", format.to_string())];
    histogram!(names::PRINT_OPTIMIZE_DURATION_SECONDS, &labels).record(duration_secs);
}
