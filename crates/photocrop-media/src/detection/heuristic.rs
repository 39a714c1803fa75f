//! Saliency-based stand-in for face detection.
//!
//! Used when the remote provider is unavailable. It asks the saliency engine
//! for the most interesting square of the image and reports a single
//! low-confidence face inside it.

use std::sync::Arc;

use async_trait::async_trait;
use image::GenericImageView;
use photocrop_models::{BoundingBox, DetectedFace, FaceDetectionOptions};
use tracing::debug;

use super::provider::{FaceDetectionProvider, ProviderImage};
use crate::codec;
use crate::error::MediaResult;
use crate::saliency::{ContentAwareCropper, SaliencyCropper};

/// Proportions of the pseudo-face placed inside the saliency crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackFaceConfig {
    /// Confidence reported for the pseudo-face
    pub confidence: f64,
    /// Face width as a fraction of crop width
    pub width_fraction: f64,
    /// Face height as a fraction of crop height
    pub height_fraction: f64,
    /// Offset of the face top from the crop top, as a fraction of crop height
    pub top_offset_fraction: f64,
}

impl Default for FallbackFaceConfig {
    fn default() -> Self {
        Self {
            confidence: 0.3,
            width_fraction: 0.4,
            height_fraction: 0.5,
            top_offset_fraction: 0.1,
        }
    }
}

impl FallbackFaceConfig {
    /// Face region for a saliency crop: horizontally centered, near the top.
    pub fn pseudo_face(&self, crop: &BoundingBox) -> DetectedFace {
        let face_width = (crop.width * self.width_fraction).round();
        let face_height = (crop.height * self.height_fraction).round();
        let region = BoundingBox::new(
            crop.x + ((crop.width - face_width) / 2.0).round(),
            crop.y + (crop.height * self.top_offset_fraction).round(),
            face_width,
            face_height,
        );
        DetectedFace::new(region, self.confidence)
    }
}

/// Heuristic provider. Never fails; problems yield no faces.
pub struct HeuristicFaceProvider {
    cropper: Arc<dyn SaliencyCropper>,
    config: FallbackFaceConfig,
}

impl Default for HeuristicFaceProvider {
    fn default() -> Self {
        Self::new(
            Arc::new(ContentAwareCropper::default()),
            FallbackFaceConfig::default(),
        )
    }
}

impl HeuristicFaceProvider {
    pub fn new(cropper: Arc<dyn SaliencyCropper>, config: FallbackFaceConfig) -> Self {
        Self { cropper, config }
    }

    pub fn config(&self) -> &FallbackFaceConfig {
        &self.config
    }

    fn detect_blocking(&self, bytes: &[u8]) -> Option<DetectedFace> {
        let decoded = match codec::decode(bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "Heuristic provider could not decode image");
                return None;
            }
        };

        let (width, height) = decoded.image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let side = width.min(height);

        match self.cropper.best_crop(&decoded.image, side, side) {
            Ok(crop) if crop.region.width > 0.0 && crop.region.height > 0.0 => {
                Some(self.config.pseudo_face(&crop.region))
            }
            Ok(_) => None,
            Err(e) => {
                debug!(
                    engine = self.cropper.name(),
                    error = %e,
                    "Saliency search failed in heuristic provider"
                );
                None
            }
        }
    }
}

#[async_trait]
impl FaceDetectionProvider for HeuristicFaceProvider {
    async fn detect(
        &self,
        image: &ProviderImage,
        _options: &FaceDetectionOptions,
    ) -> MediaResult<Vec<DetectedFace>> {
        let bytes = image.bytes.clone();
        let cropper = self.cropper.clone();
        let config = self.config;

        let face = tokio::task::spawn_blocking(move || {
            HeuristicFaceProvider::new(cropper, config).detect_blocking(&bytes)
        })
        .await
        .unwrap_or_else(|e| {
            debug!(error = %e, "Heuristic detection task failed");
            None
        });

        Ok(face.into_iter().collect())
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn uses_ai(&self) -> bool {
        false
    }
}
