//! Mapping between detection resolution and original resolution.
//!
//! Providers see a possibly downsampled image; these functions take the
//! downsample factor explicitly and map results back.

use photocrop_models::{BoundingBox, DetectedFace, FaceLandmarks, Point};

/// Divide every coordinate by `scale`, rounding to whole pixels.
///
/// A scale of 1 returns the box unchanged.
pub fn scale_bounding_box(bbox: &BoundingBox, scale: f64) -> BoundingBox {
    if scale == 1.0 || scale <= 0.0 || !scale.is_finite() {
        return *bbox;
    }
    BoundingBox::new(
        (bbox.x / scale).round(),
        (bbox.y / scale).round(),
        (bbox.width / scale).round(),
        (bbox.height / scale).round(),
    )
}

pub fn scale_point(point: &Point, scale: f64) -> Point {
    if scale == 1.0 || scale <= 0.0 || !scale.is_finite() {
        return *point;
    }
    Point::new((point.x / scale).round(), (point.y / scale).round())
}

fn scale_landmarks(landmarks: &FaceLandmarks, scale: f64) -> FaceLandmarks {
    let map = |p: Option<Point>| p.map(|p| scale_point(&p, scale));
    FaceLandmarks {
        left_eye: map(landmarks.left_eye),
        right_eye: map(landmarks.right_eye),
        nose: map(landmarks.nose),
        left_mouth: map(landmarks.left_mouth),
        right_mouth: map(landmarks.right_mouth),
    }
}

/// Tilt of a face from its eye landmarks, 0 when they are missing.
pub fn face_rotation(face: &DetectedFace) -> f64 {
    face.landmarks
        .and_then(|l| l.eye_angle_degrees())
        .unwrap_or(0.0)
}

/// Map a face to original coordinates and fill in its rotation.
pub fn rescale_face(face: &DetectedFace, scale: f64) -> DetectedFace {
    let landmarks = face.landmarks.map(|l| scale_landmarks(&l, scale));
    let mut out = DetectedFace::new(scale_bounding_box(&face.bounding_box, scale), face.confidence);
    out.landmarks = landmarks;
    out.rotation = Some(face_rotation(&out));
    out
}
