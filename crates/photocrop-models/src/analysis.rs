use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crop::CropResult;
use crate::face::FaceDetectionResult;

/// Combined output of one analysis request: face detection plus an
/// optional crop suggestion for the requested aspect ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    pub request_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub face_detection: FaceDetectionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_suggestion: Option<CropResult>,
}

impl ImageAnalysis {
    pub fn new(request_id: Uuid, face_detection: FaceDetectionResult) -> Self {
        Self {
            request_id,
            analyzed_at: Utc::now(),
            face_detection,
            crop_suggestion: None,
        }
    }

    pub fn with_crop(mut self, crop: CropResult) -> Self {
        self.crop_suggestion = Some(crop);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_suggestion_omitted_when_absent() {
        let detection = FaceDetectionResult {
            image_width: 10,
            image_height: 10,
            faces: vec![],
            processing_time_ms: 1,
            cached: false,
        };
        let analysis = ImageAnalysis::new(Uuid::new_v4(), detection);
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("cropSuggestion").is_none());
        assert_eq!(json["faceDetection"]["imageWidth"], 10);
    }
}
