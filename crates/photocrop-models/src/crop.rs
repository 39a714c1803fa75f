use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aspect::DEFAULT_ASPECT_RATIOS;
use crate::face::DetectedFace;
use crate::geometry::BoundingBox;

/// A suggested crop region with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropSuggestion {
    pub region: BoundingBox,
    /// Quality score (0-1)
    pub score: f64,
    pub includes_faces: bool,
    pub face_count: usize,
}

/// Result of a face-aware crop calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropResult {
    pub image_width: u32,
    pub image_height: u32,
    pub suggested_crop: CropSuggestion,
    /// Suggested rotation in degrees, rounded to one decimal (0 if none needed)
    pub suggested_rotation: f64,
    /// Faces that qualified for the calculation
    pub detected_faces: Vec<DetectedFace>,
    pub target_aspect_ratio: String,
}

/// Options for crop calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CropCalculatorOptions {
    /// Target aspect ratio, e.g. "1:1", "4:5"
    pub aspect_ratio: String,
    /// Minimum headroom above faces as a fraction (0-1)
    pub min_headroom: f64,
    /// Maximum headroom above faces as a fraction (0-1)
    pub max_headroom: f64,
    /// Padding around the face group as a fraction of group size
    pub padding: f64,
    pub min_face_confidence: f64,
    pub suggest_rotation: bool,
    /// Largest tilt (degrees) that will still get a correction suggestion
    pub max_rotation_suggestion: f64,
}

impl Default for CropCalculatorOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: "1:1".to_string(),
            min_headroom: 0.15,
            max_headroom: 0.25,
            padding: 0.1,
            min_face_confidence: 0.5,
            suggest_rotation: true,
            max_rotation_suggestion: 15.0,
        }
    }
}

impl CropCalculatorOptions {
    /// Defaults with a different target aspect ratio.
    pub fn with_aspect_ratio(aspect_ratio: impl Into<String>) -> Self {
        Self {
            aspect_ratio: aspect_ratio.into(),
            ..Default::default()
        }
    }
}

/// A saliency-based crop suggestion (no face data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmartCropSuggestion {
    pub region: BoundingBox,
    /// Normalized score (0-1)
    pub score: f64,
}

/// Result of multi-ratio smart crop analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SmartCropResult {
    pub image_width: u32,
    pub image_height: u32,
    /// Suggestions keyed by ratio string, in request order
    pub crops: Vec<(String, SmartCropSuggestion)>,
}

impl SmartCropResult {
    /// Look up the suggestion for a ratio string.
    pub fn get(&self, ratio: &str) -> Option<&SmartCropSuggestion> {
        self.crops
            .iter()
            .find(|(key, _)| key == ratio)
            .map(|(_, suggestion)| suggestion)
    }
}

/// Options for smart cropping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartCropOptions {
    pub aspect_ratios: Vec<String>,
}

impl Default for SmartCropOptions {
    fn default() -> Self {
        Self {
            aspect_ratios: DEFAULT_ASPECT_RATIOS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_options_defaults() {
        let opts = CropCalculatorOptions::default();
        assert_eq!(opts.aspect_ratio, "1:1");
        assert_eq!(opts.min_headroom, 0.15);
        assert_eq!(opts.max_headroom, 0.25);
        assert_eq!(opts.max_rotation_suggestion, 15.0);
    }

    #[test]
    fn test_smart_crop_default_ratios() {
        let opts = SmartCropOptions::default();
        assert_eq!(opts.aspect_ratios, vec!["1:1", "4:5", "3:4"]);
    }

    #[test]
    fn test_smart_crop_result_lookup() {
        let suggestion = SmartCropSuggestion {
            region: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            score: 0.5,
        };
        let result = SmartCropResult {
            image_width: 10,
            image_height: 10,
            crops: vec![("1:1".to_string(), suggestion)],
        };
        assert_eq!(result.get("1:1"), Some(&suggestion));
        assert_eq!(result.get("4:5"), None);
    }
}
