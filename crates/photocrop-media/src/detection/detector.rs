//! Face detection pipeline.

use std::sync::Arc;
use std::time::Instant;

use photocrop_ml_client::FaceApiClient;
use photocrop_models::{DetectedFace, FaceDetectionOptions, FaceDetectionResult};
use tracing::{debug, info};

use super::cache::{cache_key, CacheStats, DetectionCache, DetectionCacheConfig};
use super::heuristic::HeuristicFaceProvider;
use super::provider::{ProviderChain, ProviderImage};
use super::remote::RemoteFaceProvider;
use super::scaling::rescale_face;
use crate::error::{MediaError, MediaResult};
use crate::metrics;
use crate::preprocess::{preprocess, PreprocessedImage};
use crate::validate::ensure_supported_format;

/// Detects faces with caching, downsampling and provider fallback.
///
/// Only input validation errors are returned. Provider problems degrade to
/// the fallback provider and, failing that, to an empty face list.
#[derive(Clone)]
pub struct FaceDetector {
    chain: ProviderChain,
    cache: Arc<DetectionCache>,
}

impl FaceDetector {
    pub fn new(chain: ProviderChain, cache: Arc<DetectionCache>) -> Self {
        Self { chain, cache }
    }

    /// Remote provider with heuristic fallback, configured from the environment.
    pub fn from_env() -> MediaResult<Self> {
        let client = FaceApiClient::from_env()?;
        if !client.is_configured() {
            info!("Face API token not set, detection will use the heuristic provider");
        }
        let chain = ProviderChain::new(
            Arc::new(RemoteFaceProvider::new(Arc::new(client))),
            Arc::new(HeuristicFaceProvider::default()),
        );
        Ok(Self::new(
            chain,
            Arc::new(DetectionCache::new(DetectionCacheConfig::from_env())),
        ))
    }

    pub fn cache(&self) -> &Arc<DetectionCache> {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Detect faces in an encoded image.
    ///
    /// Coordinates are in the original image's pixel space. Repeated calls
    /// with the same bytes are served from the cache with `cached = true`.
    pub async fn detect_faces(
        &self,
        buffer: &[u8],
        options: &FaceDetectionOptions,
    ) -> MediaResult<FaceDetectionResult> {
        let start = Instant::now();
        if buffer.is_empty() {
            return Err(MediaError::EmptyBuffer);
        }

        let key = cache_key(buffer);
        if let Some(mut hit) = self.cache.get(&key) {
            metrics::record_cache_hit();
            hit.faces = apply_options(hit.faces, options);
            hit.cached = true;
            hit.processing_time_ms = start.elapsed().as_millis() as u64;
            debug!(key = %&key[..12], faces = hit.faces.len(), "Detection cache hit");
            return Ok(hit);
        }
        metrics::record_cache_miss();

        let format = ensure_supported_format(buffer)?;

        let owned = buffer.to_vec();
        let prepared: PreprocessedImage =
            tokio::task::spawn_blocking(move || preprocess(&owned)).await??;

        let mime_type = if prepared.reencoded {
            "image/jpeg"
        } else {
            format.mime_type()
        };
        let scale = prepared.scale;
        let (image_width, image_height) = (prepared.width, prepared.height);
        let image = ProviderImage::new(prepared.buffer, mime_type);

        let outcome = self.chain.run(&image, options).await;
        let faces: Vec<DetectedFace> = outcome
            .faces
            .iter()
            .map(|face| rescale_face(face, scale))
            .collect();

        let processing_time_ms = start.elapsed().as_millis() as u64;
        let detected = FaceDetectionResult {
            image_width,
            image_height,
            faces,
            processing_time_ms,
            cached: false,
        };
        self.cache.insert(key, detected.clone());

        let result = FaceDetectionResult {
            faces: apply_options(detected.faces, options),
            ..detected
        };

        info!(
            provider = outcome.provider,
            fell_back = outcome.fell_back,
            faces = result.faces.len(),
            width = image_width,
            height = image_height,
            scale,
            duration_ms = processing_time_ms,
            "Face detection complete"
        );
        metrics::record_detection(
            outcome.provider,
            result.faces.len(),
            start.elapsed().as_secs_f64(),
        );

        Ok(result)
    }
}

/// Confidence filter, face limit and landmark stripping.
fn apply_options(faces: Vec<DetectedFace>, options: &FaceDetectionOptions) -> Vec<DetectedFace> {
    faces
        .into_iter()
        .filter(|face| face.confidence >= options.min_confidence)
        .take(options.max_faces)
        .map(|mut face| {
            if !options.include_landmarks {
                face.landmarks = None;
            }
            face
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_images;
    use crate::detection::provider::testing::StaticProvider;
    use photocrop_models::{BoundingBox, FaceLandmarks, Point};

    fn face(x: f64, confidence: f64) -> DetectedFace {
        DetectedFace::new(BoundingBox::new(x, 10.0, 40.0, 40.0), confidence)
    }

    fn detector(primary: Arc<StaticProvider>, fallback: Arc<StaticProvider>) -> FaceDetector {
        FaceDetector::new(
            ProviderChain::new(primary, fallback),
            Arc::new(DetectionCache::default()),
        )
    }

    #[tokio::test]
    async fn test_empty_buffer_rejected() {
        let det = detector(
            StaticProvider::ok("primary", vec![]),
            StaticProvider::ok("fallback", vec![]),
        );
        let err = det
            .detect_faces(&[], &FaceDetectionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EmptyBuffer));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unsupported_format_rejected() {
        let det = detector(
            StaticProvider::ok("primary", vec![]),
            StaticProvider::ok("fallback", vec![]),
        );
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
        let err = det
            .detect_faces(&gif, &FaceDetectionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat(_)));

        let err = det
            .detect_faces(b"definitely not an image", &FaceDetectionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn test_second_call_is_cached() {
        let primary = StaticProvider::ok("primary", vec![face(10.0, 0.9)]);
        let det = detector(primary.clone(), StaticProvider::ok("fallback", vec![]));
        let bytes = test_images::jpeg(200, 150);
        let options = FaceDetectionOptions::default();

        let first = det.detect_faces(&bytes, &options).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.faces.len(), 1);
        assert_eq!((first.image_width, first.image_height), (200, 150));

        let second = det.detect_faces(&bytes, &options).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.faces, first.faces);
        assert_eq!(primary.calls(), 1);

        assert_eq!(det.cache_stats().size, 1);
        det.clear_cache();
        assert_eq!(det.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_faces_rescaled_to_original() {
        let primary = StaticProvider::ok(
            "primary",
            vec![DetectedFace::new(BoundingBox::new(100.0, 50.0, 64.0, 64.0), 0.95)],
        );
        let det = detector(primary, StaticProvider::ok("fallback", vec![]));
        let bytes = test_images::jpeg(4096, 1024);

        let result = det
            .detect_faces(&bytes, &FaceDetectionOptions::default())
            .await
            .unwrap();
        assert_eq!((result.image_width, result.image_height), (4096, 1024));
        assert_eq!(
            result.faces[0].bounding_box,
            BoundingBox::new(200.0, 100.0, 128.0, 128.0)
        );
        assert_eq!(result.faces[0].rotation, Some(0.0));
    }

    #[tokio::test]
    async fn test_options_filter_and_limit() {
        let tilted = face(0.0, 0.95).with_landmarks(FaceLandmarks {
            left_eye: Some(Point::new(0.0, 0.0)),
            right_eye: Some(Point::new(10.0, 10.0)),
            ..Default::default()
        });
        let primary = StaticProvider::ok(
            "primary",
            vec![tilted, face(50.0, 0.4), face(100.0, 0.8), face(150.0, 0.7)],
        );
        let det = detector(primary, StaticProvider::ok("fallback", vec![]));
        let bytes = test_images::png(300, 100);

        let options = FaceDetectionOptions {
            min_confidence: 0.5,
            max_faces: 2,
            include_landmarks: false,
        };
        let result = det.detect_faces(&bytes, &options).await.unwrap();
        assert_eq!(result.faces.len(), 2);
        assert!(result.faces.iter().all(|f| f.confidence >= 0.5));
        assert!(result.faces[0].landmarks.is_none());
        assert!((result.faces[0].rotation.unwrap() - 45.0).abs() < 1e-9);

        // Cached hits honour per-call options.
        let wide = FaceDetectionOptions {
            min_confidence: 0.1,
            max_faces: 10,
            include_landmarks: true,
        };
        let cached = det.detect_faces(&bytes, &wide).await.unwrap();
        assert!(cached.cached);
        assert_eq!(cached.faces.len(), 4);
        assert!(cached.faces[0].landmarks.is_some());
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_fails() {
        let fallback = StaticProvider::ok("fallback", vec![face(20.0, 0.3)]);
        let det = detector(StaticProvider::failing("primary"), fallback.clone());
        let bytes = test_images::jpeg(120, 120);

        let result = det
            .detect_faces(&bytes, &FaceDetectionOptions::default())
            .await
            .unwrap();
        assert!(result.faces.is_empty());
        assert_eq!(fallback.calls(), 1);

        let loose = FaceDetectionOptions {
            min_confidence: 0.2,
            ..Default::default()
        };
        let cached = det.detect_faces(&bytes, &loose).await.unwrap();
        assert_eq!(cached.faces.len(), 1);
        assert_eq!(cached.faces[0].confidence, 0.3);
    }

    #[tokio::test]
    async fn test_total_provider_failure_returns_no_faces() {
        let det = detector(
            StaticProvider::failing("primary"),
            StaticProvider::failing("fallback"),
        );
        let result = det
            .detect_faces(&test_images::png(80, 60), &FaceDetectionOptions::default())
            .await
            .unwrap();
        assert!(result.faces.is_empty());
        assert!(!result.cached);
    }
}
