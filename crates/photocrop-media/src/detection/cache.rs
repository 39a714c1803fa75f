//! In-process detection cache keyed by image content hash.
//!
//! Expiry and capacity are enforced on every insert; there is no background
//! sweeper.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use photocrop_models::FaceDetectionResult;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 of the buffer as lowercase hex.
pub fn cache_key(buffer: &[u8]) -> String {
    format!("{:x}", Sha256::digest(buffer))
}

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for DetectionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_entries: 1000,
        }
    }
}

impl DetectionCacheConfig {
    /// Read `DETECTION_CACHE_TTL_SECS` and `DETECTION_CACHE_MAX_ENTRIES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: std::env::var("DETECTION_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            max_entries: std::env::var("DETECTION_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_entries),
        }
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_ms: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: FaceDetectionResult,
    timestamp: Instant,
}

/// Thread-safe TTL + capacity bounded map of detection results.
#[derive(Debug)]
pub struct DetectionCache {
    config: DetectionCacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for DetectionCache {
    fn default() -> Self {
        Self::new(DetectionCacheConfig::default())
    }
}

impl DetectionCache {
    pub fn new(config: DetectionCacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DetectionCacheConfig {
        &self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<FaceDetectionResult> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`; expired entries are removed and miss.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<FaceDetectionResult> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => now.saturating_duration_since(entry.timestamp) > self.config.ttl,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.result.clone())
    }

    pub fn insert(&self, key: String, result: FaceDetectionResult) {
        self.insert_at(key, result, Instant::now());
    }

    /// Store a result, then drop expired entries and evict the oldest
    /// while over capacity.
    pub fn insert_at(&self, key: String, result: FaceDetectionResult, now: Instant) {
        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                result,
                timestamp: now,
            },
        );

        let ttl = self.config.ttl;
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.timestamp) <= ttl);
        let expired = before - entries.len();

        let mut evicted = 0usize;
        while entries.len() > self.config.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }

        if expired > 0 || evicted > 0 {
            debug!(expired, evicted, size = entries.len(), "Detection cache maintenance");
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.config.max_entries,
            ttl_ms: self.config.ttl.as_millis() as u64,
        }
    }
}
