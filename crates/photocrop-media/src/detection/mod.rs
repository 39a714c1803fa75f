//! Face detection with provider fallback and result caching.
//!
//! | Provider | Source | Confidence |
//! |----------|--------|------------|
//! | `remote` | Hosted prediction API | model-reported |
//! | `heuristic` | Saliency crop of the image | fixed, low |
//!
//! [`FaceDetector`] runs the providers through a [`ProviderChain`], maps
//! coordinates back to the original resolution, and caches results by
//! content hash in a [`DetectionCache`].

pub mod cache;
pub mod detector;
pub mod heuristic;
pub mod provider;
pub mod remote;
pub mod scaling;

pub use cache::{cache_key, CacheStats, DetectionCache, DetectionCacheConfig};
pub use detector::FaceDetector;
pub use heuristic::{FallbackFaceConfig, HeuristicFaceProvider};
pub use provider::{ChainOutcome, FaceDetectionProvider, ProviderChain, ProviderImage};
pub use remote::RemoteFaceProvider;
pub use scaling::{face_rotation, rescale_face, scale_bounding_box};
