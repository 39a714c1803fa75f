//! Prediction service request/response types.

use photocrop_models::{BoundingBox, DetectedFace, FaceLandmarks, Point};
use serde::{Deserialize, Serialize};

use crate::error::{MlError, MlResult};

/// Body of `POST /v1/predictions`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    /// Model version hash
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionInput {
    /// Image as a `data:<mime>;base64,...` URL
    pub image: String,
    pub min_confidence: f64,
}

/// Lifecycle state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

/// Prediction as returned by create and status calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub urls: PredictionUrls,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl Prediction {
    /// Status URL to poll.
    pub fn status_url(&self) -> MlResult<&str> {
        self.urls.get.as_deref().ok_or_else(|| {
            MlError::InvalidResponse(format!("prediction {} has no status URL", self.id))
        })
    }

    /// Error message reported by the service, if any.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "no error detail".to_string(),
        }
    }

    /// Parse the output as a list of faces. A missing output means no faces.
    pub fn faces(&self) -> MlResult<Vec<RawFace>> {
        match &self.output {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                MlError::InvalidResponse(format!("unexpected prediction output: {}", e))
            }),
        }
    }
}

/// One face as emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFace {
    /// Corner coordinates `[x1, y1, x2, y2]`
    pub bbox: Vec<f64>,
    pub confidence: f64,
    #[serde(default)]
    pub landmarks: Option<RawLandmarks>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLandmarks {
    #[serde(default)]
    pub left_eye: Option<[f64; 2]>,
    #[serde(default)]
    pub right_eye: Option<[f64; 2]>,
    #[serde(default)]
    pub nose: Option<[f64; 2]>,
    #[serde(default, alias = "mouth_left")]
    pub left_mouth: Option<[f64; 2]>,
    #[serde(default, alias = "mouth_right")]
    pub right_mouth: Option<[f64; 2]>,
}

fn to_point(p: Option<[f64; 2]>) -> Option<Point> {
    p.map(|[x, y]| Point::new(x, y))
}

impl From<RawLandmarks> for FaceLandmarks {
    fn from(raw: RawLandmarks) -> Self {
        FaceLandmarks {
            left_eye: to_point(raw.left_eye),
            right_eye: to_point(raw.right_eye),
            nose: to_point(raw.nose),
            left_mouth: to_point(raw.left_mouth),
            right_mouth: to_point(raw.right_mouth),
        }
    }
}

impl TryFrom<RawFace> for DetectedFace {
    type Error = MlError;

    fn try_from(raw: RawFace) -> MlResult<Self> {
        let [x1, y1, x2, y2] = <[f64; 4]>::try_from(raw.bbox.as_slice()).map_err(|_| {
            MlError::InvalidResponse(format!(
                "bbox must have 4 coordinates, got {}",
                raw.bbox.len()
            ))
        })?;

        if !raw.confidence.is_finite() {
            return Err(MlError::InvalidResponse("non-finite confidence".to_string()));
        }

        let mut face = DetectedFace::new(
            BoundingBox::from_corners(x1, y1, x2, y2),
            raw.confidence.clamp(0.0, 1.0),
        );
        if let Some(landmarks) = raw.landmarks {
            face = face.with_landmarks(landmarks.into());
        }
        Ok(face)
    }
}
