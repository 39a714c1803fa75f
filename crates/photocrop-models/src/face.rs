use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point};

/// Key facial landmarks reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_eye: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_eye: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nose: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_mouth: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_mouth: Option<Point>,
}

impl FaceLandmarks {
    /// Tilt of the eye line in degrees (positive = clockwise), when both eyes are known.
    pub fn eye_angle_degrees(&self) -> Option<f64> {
        let (left, right) = (self.left_eye?, self.right_eye?);
        let dx = right.x - left.x;
        let dy = right.y - left.y;
        Some(dy.atan2(dx).to_degrees())
    }
}

/// A detected face with bounding box and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
    /// Rotation angle in degrees (positive = clockwise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<FaceLandmarks>,
}

impl DetectedFace {
    /// Create a face without rotation or landmarks.
    pub fn new(bounding_box: BoundingBox, confidence: f64) -> Self {
        Self {
            bounding_box,
            confidence,
            rotation: None,
            landmarks: None,
        }
    }

    /// Builder-style setter for rotation.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Builder-style setter for landmarks.
    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// Result of one face detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectionResult {
    /// Original image dimensions
    pub image_width: u32,
    pub image_height: u32,
    pub faces: Vec<DetectedFace>,
    pub processing_time_ms: u64,
    /// Whether the result came from the detection cache
    pub cached: bool,
}

/// Options for face detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FaceDetectionOptions {
    /// Minimum confidence threshold (0-1)
    pub min_confidence: f64,
    /// Maximum number of faces to return
    pub max_faces: usize,
    /// Whether to include facial landmarks in the output
    pub include_landmarks: bool,
}

impl Default for FaceDetectionOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_faces: 20,
            include_landmarks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_angle_level_eyes() {
        let landmarks = FaceLandmarks {
            left_eye: Some(Point::new(10.0, 50.0)),
            right_eye: Some(Point::new(60.0, 50.0)),
            ..Default::default()
        };
        assert_eq!(landmarks.eye_angle_degrees(), Some(0.0));
    }

    #[test]
    fn test_eye_angle_tilted() {
        let landmarks = FaceLandmarks {
            left_eye: Some(Point::new(0.0, 0.0)),
            right_eye: Some(Point::new(10.0, 10.0)),
            ..Default::default()
        };
        let angle = landmarks.eye_angle_degrees().unwrap();
        assert!((angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_eye_angle_requires_both_eyes() {
        let landmarks = FaceLandmarks {
            left_eye: Some(Point::new(0.0, 0.0)),
            ..Default::default()
        };
        assert_eq!(landmarks.eye_angle_degrees(), None);
    }

    #[test]
    fn test_face_serializes_camel_case() {
        let face = DetectedFace::new(BoundingBox::new(1.0, 2.0, 3.0, 4.0), 0.9);
        let json = serde_json::to_value(&face).unwrap();
        assert!(json.get("boundingBox").is_some());
        assert!(json.get("rotation").is_none());
    }

    #[test]
    fn test_options_partial_json_uses_defaults() {
        let opts: FaceDetectionOptions = serde_json::from_str(r#"{"maxFaces": 3}"#).unwrap();
        assert_eq!(opts.max_faces, 3);
        assert_eq!(opts.min_confidence, 0.5);
        assert!(!opts.include_landmarks);
    }
}
