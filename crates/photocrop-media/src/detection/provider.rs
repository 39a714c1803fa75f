//! Provider trait and the primary/fallback strategy.

use std::sync::Arc;

use async_trait::async_trait;
use photocrop_models::{DetectedFace, FaceDetectionOptions};
use tracing::warn;

use crate::error::MediaResult;
use crate::metrics;

/// Encoded image handed to a provider.
#[derive(Debug, Clone)]
pub struct ProviderImage {
    pub bytes: Arc<[u8]>,
    pub mime_type: &'static str,
}

impl ProviderImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
        }
    }
}

/// Face detection provider.
///
/// Returned boxes are in the coordinate space of the image the provider
/// was given.
#[async_trait]
pub trait FaceDetectionProvider: Send + Sync {
    async fn detect(
        &self,
        image: &ProviderImage,
        options: &FaceDetectionOptions,
    ) -> MediaResult<Vec<DetectedFace>>;

    /// Provider name for logging and metrics.
    fn name(&self) -> &'static str;

    /// Whether this provider uses AI/ML detection (vs pure heuristics).
    fn uses_ai(&self) -> bool;
}

/// Faces plus the provider that produced them.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub faces: Vec<DetectedFace>,
    pub provider: &'static str,
    pub fell_back: bool,
}

/// Tries the primary provider and degrades to the fallback on any error.
#[derive(Clone)]
pub struct ProviderChain {
    primary: Arc<dyn FaceDetectionProvider>,
    fallback: Arc<dyn FaceDetectionProvider>,
}

impl ProviderChain {
    pub fn new(
        primary: Arc<dyn FaceDetectionProvider>,
        fallback: Arc<dyn FaceDetectionProvider>,
    ) -> Self {
        Self { primary, fallback }
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Run the strategy. Never fails; total failure yields no faces.
    pub async fn run(&self, image: &ProviderImage, options: &FaceDetectionOptions) -> ChainOutcome {
        match self.primary.detect(image, options).await {
            Ok(faces) => {
                return ChainOutcome {
                    faces,
                    provider: self.primary.name(),
                    fell_back: false,
                }
            }
            Err(e) => {
                warn!(
                    provider = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary face provider failed, falling back"
                );
                metrics::record_provider_fallback(self.primary.name(), self.fallback.name());
            }
        }

        let faces = match self.fallback.detect(image, options).await {
            Ok(faces) => faces,
            Err(e) => {
                warn!(
                    provider = self.fallback.name(),
                    error = %e,
                    "Fallback face provider failed, returning no faces"
                );
                Vec::new()
            }
        };

        ChainOutcome {
            faces,
            provider: self.fallback.name(),
            fell_back: true,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::MediaError;

    /// Provider returning a fixed answer and counting calls.
    pub struct StaticProvider {
        pub name: &'static str,
        pub faces: Option<Vec<DetectedFace>>,
        pub calls: AtomicUsize,
    }

    impl StaticProvider {
        pub fn ok(name: &'static str, faces: Vec<DetectedFace>) -> Arc<Self> {
            Arc::new(Self {
                name,
                faces: Some(faces),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                faces: None,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FaceDetectionProvider for StaticProvider {
        async fn detect(
            &self,
            _image: &ProviderImage,
            _options: &FaceDetectionOptions,
        ) -> MediaResult<Vec<DetectedFace>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.faces
                .clone()
                .ok_or_else(|| MediaError::detection_failed("provider unavailable"))
        }

        fn name(&self) -> &'static str {
            self.name
        }

        fn uses_ai(&self) -> bool {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticProvider;
    use super::*;
    use photocrop_models::BoundingBox;

    fn image() -> ProviderImage {
        ProviderImage::new(vec![1u8, 2, 3], "image/jpeg")
    }

    fn one_face() -> Vec<DetectedFace> {
        vec![DetectedFace::new(BoundingBox::new(1.0, 1.0, 10.0, 10.0), 0.9)]
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = StaticProvider::ok("primary", one_face());
        let fallback = StaticProvider::ok("fallback", vec![]);
        let chain = ProviderChain::new(primary.clone(), fallback.clone());

        let outcome = chain.run(&image(), &FaceDetectionOptions::default()).await;
        assert_eq!(outcome.faces.len(), 1);
        assert_eq!(outcome.provider, "primary");
        assert!(!outcome.fell_back);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback() {
        let chain = ProviderChain::new(
            StaticProvider::failing("primary"),
            StaticProvider::ok("fallback", one_face()),
        );
        let outcome = chain.run(&image(), &FaceDetectionOptions::default()).await;
        assert_eq!(outcome.faces.len(), 1);
        assert_eq!(outcome.provider, "fallback");
        assert!(outcome.fell_back);
    }

    #[tokio::test]
    async fn test_both_failing_yields_no_faces() {
        let chain = ProviderChain::new(
            StaticProvider::failing("primary"),
            StaticProvider::failing("fallback"),
        );
        let outcome = chain.run(&image(), &FaceDetectionOptions::default()).await;
        assert!(outcome.faces.is_empty());
        assert!(outcome.fell_back);
    }
}
