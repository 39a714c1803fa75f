//! Service configuration.

use std::time::Duration;

use photocrop_models::MAX_FILE_SIZE;

/// Analysis service configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Overall budget for one face detection call
    pub detection_timeout: Duration,
    /// Timeout for fetching `http(s)` image sources
    pub fetch_timeout: Duration,
    /// Largest accepted image source in bytes
    pub max_image_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            detection_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(30),
            max_image_size: MAX_FILE_SIZE,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            detection_timeout: Duration::from_secs(
                std::env::var("DETECTION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            fetch_timeout: Duration::from_secs(
                std::env::var("SOURCE_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_image_size: MAX_FILE_SIZE,
        }
    }
}
