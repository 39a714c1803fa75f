//! Saliency-based crop suggestions for several aspect ratios at once.

use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use photocrop_models::{AspectRatio, SmartCropOptions, SmartCropResult, SmartCropSuggestion};
use tracing::{debug, warn};

use crate::codec;
use crate::crop_calculator::{adjust_crop_to_fit, centered_crop, NEUTRAL_SCORE};
use crate::error::{MediaError, MediaResult};
use crate::saliency::{ContentAwareCropper, SaliencyCropper};

/// Map an unbounded saliency score into `[0, 1]`.
pub fn normalize_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return NEUTRAL_SCORE;
    }
    if raw <= 0.0 {
        return 0.0;
    }
    (raw / (raw + 100.0)).clamp(0.0, 1.0)
}

/// Suggests crops from image content alone, without face data.
#[derive(Clone)]
pub struct SmartCropAdvisor {
    cropper: Arc<dyn SaliencyCropper>,
}

impl Default for SmartCropAdvisor {
    fn default() -> Self {
        Self::new(Arc::new(ContentAwareCropper::default()))
    }
}

impl SmartCropAdvisor {
    pub fn new(cropper: Arc<dyn SaliencyCropper>) -> Self {
        Self { cropper }
    }

    /// Suggest one crop per requested aspect ratio.
    ///
    /// Fails only when the buffer is empty or cannot be decoded. Invalid
    /// ratio strings are skipped.
    pub async fn get_suggested_crops(
        &self,
        buffer: &[u8],
        options: &SmartCropOptions,
    ) -> MediaResult<SmartCropResult> {
        if buffer.is_empty() {
            return Err(MediaError::EmptyBuffer);
        }

        let buffer = buffer.to_vec();
        let ratios = options.aspect_ratios.clone();
        let advisor = self.clone();

        tokio::task::spawn_blocking(move || -> MediaResult<SmartCropResult> {
            let decoded = codec::decode(&buffer)
                .map_err(|e| MediaError::invalid_image(e.to_string()))?;
            Ok(advisor.suggest_for_image(&decoded.image, &ratios))
        })
        .await?
    }

    /// Synchronous core of [`get_suggested_crops`](Self::get_suggested_crops).
    pub fn suggest_for_image(&self, image: &DynamicImage, ratios: &[String]) -> SmartCropResult {
        let (width, height) = image.dimensions();
        let mut crops: Vec<(String, SmartCropSuggestion)> = Vec::with_capacity(ratios.len());

        for ratio_str in ratios {
            if crops.iter().any(|(key, _)| key == ratio_str) {
                continue;
            }
            let ratio = match AspectRatio::parse(ratio_str) {
                Ok(ratio) => ratio,
                Err(e) => {
                    warn!(ratio = %ratio_str, error = %e, "Skipping invalid aspect ratio");
                    continue;
                }
            };

            let baseline = centered_crop(width, height, ratio);
            let suggestion = match self.cropper.best_crop(
                image,
                baseline.width as u32,
                baseline.height as u32,
            ) {
                Ok(found) => SmartCropSuggestion {
                    region: adjust_crop_to_fit(&found.region, width, height),
                    score: normalize_score(found.score),
                },
                Err(e) => {
                    debug!(
                        ratio = %ratio_str,
                        engine = self.cropper.name(),
                        error = %e,
                        "Saliency search failed, using centered crop"
                    );
                    SmartCropSuggestion {
                        region: baseline,
                        score: NEUTRAL_SCORE,
                    }
                }
            };
            crops.push((ratio_str.clone(), suggestion));
        }

        SmartCropResult {
            image_width: width,
            image_height: height,
            crops,
        }
    }
}
