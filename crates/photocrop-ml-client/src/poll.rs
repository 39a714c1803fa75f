//! Polling policy for long-running predictions.

use std::time::Duration;

/// How often to poll a prediction and how long to wait overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Wall-clock budget covering prediction creation and polling
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: Duration::from_secs(10),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// Create policy from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("FACE_API_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            deadline: std::env::var("FACE_API_POLL_DEADLINE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.deadline),
        }
    }
}
