//! Face-aware crop geometry.
//!
//! Given image dimensions and detected faces, computes the crop region for a
//! target aspect ratio:
//!
//! 1. Faces below `min_face_confidence` are dropped; with none left the
//!    largest centered crop is returned with a neutral score.
//! 2. The union of the remaining face boxes is padded, given headroom, and
//!    grown to the target ratio, then shrunk to fit the image if needed.
//! 3. The crop is centered horizontally on the group and placed so the group
//!    center sits 65% of the way down, then clamped into the image.
//! 4. The score blends how much of the crop the faces fill with their mean
//!    confidence.
//!
//! All functions here are pure.

use photocrop_models::{
    AspectRatio, AspectRatioParseError, BoundingBox, CropCalculatorOptions, CropResult,
    CropSuggestion, DetectedFace,
};

use crate::error::MediaResult;

/// Where the face group center sits, as a fraction of crop height from the top.
const FACE_VERTICAL_POSITION: f64 = 0.65;

/// Face-area / crop-area window considered ideal for portraits.
const IDEAL_MIN_FACE_RATIO: f64 = 0.15;
const IDEAL_MAX_FACE_RATIO: f64 = 0.30;

/// Score given to crops that are not based on faces.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Smallest tilt (degrees) worth correcting.
const MIN_ROTATION_SUGGESTION: f64 = 5.0;

/// Parse a `"W:H"` aspect ratio string.
pub fn parse_aspect_ratio(ratio: &str) -> Result<AspectRatio, AspectRatioParseError> {
    AspectRatio::parse(ratio)
}

/// Whether `ratio` is a well-formed aspect ratio.
pub fn is_valid_aspect_ratio(ratio: &str) -> bool {
    AspectRatio::is_valid(ratio)
}

// Bounds may cross when a rounded crop exceeds the image; the lower bound wins.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(value))
}

/// Largest centered crop of `ratio` that fits the image.
pub fn calculate_centered_crop(
    image_width: u32,
    image_height: u32,
    ratio: &str,
) -> MediaResult<BoundingBox> {
    let ratio = parse_aspect_ratio(ratio)?;
    Ok(centered_crop(image_width, image_height, ratio))
}

pub(crate) fn centered_crop(image_width: u32, image_height: u32, ratio: AspectRatio) -> BoundingBox {
    let (w, h) = (image_width as f64, image_height as f64);
    let target = ratio.as_f64();

    let (crop_width, crop_height) = if w / h > target {
        (h * target, h)
    } else {
        (w, w / target)
    };

    let crop_width = crop_width.round().clamp(1.0, w.max(1.0));
    let crop_height = crop_height.round().clamp(1.0, h.max(1.0));

    BoundingBox::new(
        ((w - crop_width) / 2.0).round(),
        ((h - crop_height) / 2.0).round(),
        crop_width,
        crop_height,
    )
}

/// Minimal rectangle enclosing every face, or `None` without faces.
pub fn calculate_face_group_bounds(faces: &[DetectedFace]) -> Option<BoundingBox> {
    BoundingBox::union(faces.iter().map(|f| &f.bounding_box))
}

/// Mean of the non-zero face rotations; 0 when there are none.
pub fn calculate_average_rotation(faces: &[DetectedFace]) -> f64 {
    let rotations: Vec<f64> = faces
        .iter()
        .filter_map(|f| f.rotation)
        .filter(|r| *r != 0.0)
        .collect();

    if rotations.is_empty() {
        return 0.0;
    }
    rotations.iter().sum::<f64>() / rotations.len() as f64
}

/// Geometry score for the fraction of the crop covered by faces.
pub(crate) fn face_ratio_score(face_ratio: f64) -> f64 {
    if face_ratio < IDEAL_MIN_FACE_RATIO {
        0.5 + (face_ratio / IDEAL_MIN_FACE_RATIO) * 0.25
    } else if face_ratio > IDEAL_MAX_FACE_RATIO {
        0.75 - (face_ratio - IDEAL_MAX_FACE_RATIO) * 0.5
    } else {
        0.75 + ((face_ratio - IDEAL_MIN_FACE_RATIO) / (IDEAL_MAX_FACE_RATIO - IDEAL_MIN_FACE_RATIO))
            * 0.25
    }
}

fn qualified_faces(faces: &[DetectedFace], min_confidence: f64) -> Vec<DetectedFace> {
    faces
        .iter()
        .filter(|f| f.confidence >= min_confidence)
        .cloned()
        .collect()
}

/// Crop that frames the qualifying faces with padding and headroom.
pub fn calculate_face_crop(
    image_width: u32,
    image_height: u32,
    faces: &[DetectedFace],
    options: &CropCalculatorOptions,
) -> MediaResult<CropSuggestion> {
    let ratio = parse_aspect_ratio(&options.aspect_ratio)?;
    let qualified = qualified_faces(faces, options.min_face_confidence);

    let Some(bounds) = calculate_face_group_bounds(&qualified) else {
        return Ok(CropSuggestion {
            region: centered_crop(image_width, image_height, ratio),
            score: NEUTRAL_SCORE,
            includes_faces: false,
            face_count: 0,
        });
    };

    let (img_w, img_h) = (image_width as f64, image_height as f64);
    let target = ratio.as_f64();

    let padding_x = bounds.width * options.padding;
    let padding_y = bounds.height * options.padding;
    let expanded_width = bounds.width + padding_x * 2.0;
    let expanded_height = bounds.height + padding_y * 2.0;

    let headroom = (options.min_headroom + options.max_headroom) / 2.0;
    let required_width = expanded_width;
    let required_height = expanded_height * (1.0 + headroom);

    let (mut crop_width, mut crop_height) = if required_width / required_height > target {
        (required_width, required_width / target)
    } else {
        (required_height * target, required_height)
    };

    if crop_width > img_w {
        crop_width = img_w;
        crop_height = crop_width / target;
    }
    if crop_height > img_h {
        crop_height = img_h;
        crop_width = crop_height * target;
    }

    let crop_width = crop_width.round().max(1.0);
    let crop_height = crop_height.round().max(1.0);

    let crop_x = (bounds.center_x() - crop_width / 2.0).round();
    let crop_y = (bounds.center_y() - crop_height * FACE_VERTICAL_POSITION).round();

    let region = adjust_crop_to_fit(
        &BoundingBox::new(
            clamp(crop_x, 0.0, img_w - crop_width),
            clamp(crop_y, 0.0, img_h - crop_height),
            crop_width,
            crop_height,
        ),
        image_width,
        image_height,
    );

    let face_area: f64 = qualified.iter().map(|f| f.bounding_box.area()).sum();
    let face_ratio = face_area / region.area();
    let avg_confidence =
        qualified.iter().map(|f| f.confidence).sum::<f64>() / qualified.len() as f64;
    let score = face_ratio_score(face_ratio) * 0.7 + avg_confidence * 0.3;

    Ok(CropSuggestion {
        region,
        score: clamp(score, 0.0, 1.0),
        includes_faces: true,
        face_count: qualified.len(),
    })
}

/// Crop suggestion plus a rotation that would level the faces.
pub fn calculate_optimal_crop(
    image_width: u32,
    image_height: u32,
    faces: &[DetectedFace],
    options: &CropCalculatorOptions,
) -> MediaResult<CropResult> {
    let qualified = qualified_faces(faces, options.min_face_confidence);
    let suggested_crop = calculate_face_crop(image_width, image_height, &qualified, options)?;

    let mut suggested_rotation = 0.0;
    if options.suggest_rotation && !qualified.is_empty() {
        let tilt = calculate_average_rotation(&qualified);
        if tilt.abs() >= MIN_ROTATION_SUGGESTION && tilt.abs() <= options.max_rotation_suggestion {
            suggested_rotation = -tilt;
        }
    }
    // Avoid reporting -0.0.
    let suggested_rotation = (suggested_rotation * 10.0).round() / 10.0 + 0.0;

    Ok(CropResult {
        image_width,
        image_height,
        suggested_crop,
        suggested_rotation,
        detected_faces: qualified,
        target_aspect_ratio: options.aspect_ratio.clone(),
    })
}

/// Whether `region` has positive size and lies inside the image.
pub fn is_valid_crop_region(region: &BoundingBox, image_width: u32, image_height: u32) -> bool {
    region.is_within(image_width as f64, image_height as f64)
}

/// Shrink `region` to the image size, then slide it inside the image.
pub fn adjust_crop_to_fit(region: &BoundingBox, image_width: u32, image_height: u32) -> BoundingBox {
    let (img_w, img_h) = (image_width as f64, image_height as f64);
    let width = region.width.min(img_w);
    let height = region.height.min(img_h);

    BoundingBox::new(
        clamp(region.x, 0.0, img_w - width),
        clamp(region.y, 0.0, img_h - height),
        width,
        height,
    )
}
