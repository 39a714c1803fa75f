//! End-to-end detection and cropping through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use photocrop_media::{
    calculate_optimal_crop, is_valid_crop_region, DetectionCache, DetectionCacheConfig,
    FaceDetectionProvider, FaceDetector, HeuristicFaceProvider, MediaError, MediaResult,
    ProviderChain, ProviderImage,
};
use photocrop_models::{
    BoundingBox, CropCalculatorOptions, DetectedFace, FaceDetectionOptions, ValidationCode,
};

/// Stands in for the remote service.
struct MockRemote {
    faces: Vec<DetectedFace>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockRemote {
    fn returning(faces: Vec<DetectedFace>) -> Arc<Self> {
        Arc::new(Self {
            faces,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            faces: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FaceDetectionProvider for MockRemote {
    async fn detect(
        &self,
        _image: &ProviderImage,
        _options: &FaceDetectionOptions,
    ) -> MediaResult<Vec<DetectedFace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MediaError::detection_failed("service unreachable"));
        }
        Ok(self.faces.clone())
    }

    fn name(&self) -> &'static str {
        "mock_remote"
    }

    fn uses_ai(&self) -> bool {
        true
    }
}

fn portrait_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(width, height, Rgb([70, 90, 110]));
    let (fx, fy, fs) = (width / 3, height / 4, width / 4);
    for y in fy..(fy + fs).min(height) {
        for x in fx..(fx + fs).min(width) {
            img.put_pixel(x, y, Rgb([225, 170, 140]));
        }
    }
    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}

fn detector(remote: Arc<MockRemote>) -> FaceDetector {
    FaceDetector::new(
        ProviderChain::new(remote, Arc::new(HeuristicFaceProvider::default())),
        Arc::new(DetectionCache::new(DetectionCacheConfig::default())),
    )
}

#[tokio::test]
async fn test_validation_errors_surface() {
    let det = detector(MockRemote::returning(vec![]));
    let options = FaceDetectionOptions::default();

    let empty = det.detect_faces(&[], &options).await.unwrap_err();
    assert_eq!(empty.validation_code(), Some(ValidationCode::EmptyFile));

    let bmp = b"BM\x1e\x00\x00\x00\x00\x00\x00\x00\x1a\x00\x00\x00".to_vec();
    let unsupported = det.detect_faces(&bmp, &options).await.unwrap_err();
    assert_eq!(
        unsupported.validation_code(),
        Some(ValidationCode::UnsupportedType)
    );
}

#[tokio::test]
async fn test_detect_then_crop() {
    let face = DetectedFace::new(BoundingBox::new(400.0, 300.0, 300.0, 300.0), 0.92);
    let remote = MockRemote::returning(vec![face]);
    let det = detector(remote.clone());
    let bytes = portrait_jpeg(1200, 1600);

    let detection = det
        .detect_faces(&bytes, &FaceDetectionOptions::default())
        .await
        .unwrap();
    assert_eq!((detection.image_width, detection.image_height), (1200, 1600));
    assert_eq!(detection.faces.len(), 1);

    let crop = calculate_optimal_crop(
        detection.image_width,
        detection.image_height,
        &detection.faces,
        &CropCalculatorOptions::with_aspect_ratio("4:5"),
    )
    .unwrap();
    let region = crop.suggested_crop.region;
    assert!(crop.suggested_crop.includes_faces);
    assert!(is_valid_crop_region(&region, 1200, 1600));
    assert!((region.width / region.height - 0.8).abs() < 0.01);
    assert!(region.x <= 400.0 && region.right() >= 700.0);

    let again = det
        .detect_faces(&bytes, &FaceDetectionOptions::default())
        .await
        .unwrap();
    assert!(again.cached);
    assert_eq!(again.faces, detection.faces);
    assert_eq!(remote.calls.load(Ordering::SeqCst), 1);

    det.clear_cache();
    assert_eq!(det.cache_stats().size, 0);
}

#[tokio::test]
async fn test_remote_outage_degrades_to_heuristic() {
    let det = detector(MockRemote::unavailable());
    let bytes = portrait_jpeg(600, 800);

    let options = FaceDetectionOptions {
        min_confidence: 0.25,
        ..Default::default()
    };
    let detection = det.detect_faces(&bytes, &options).await.unwrap();
    assert_eq!(detection.faces.len(), 1);
    let face = &detection.faces[0];
    assert_eq!(face.confidence, 0.3);
    assert!(face.bounding_box.is_within(600.0, 800.0));

    // Default threshold drops the low-confidence stand-in.
    let strict = det
        .detect_faces(&bytes, &FaceDetectionOptions::default())
        .await
        .unwrap();
    assert!(strict.cached);
    assert!(strict.faces.is_empty());

    let crop = calculate_optimal_crop(
        600,
        800,
        &strict.faces,
        &CropCalculatorOptions::default(),
    )
    .unwrap();
    assert!(!crop.suggested_crop.includes_faces);
    assert_eq!(crop.suggested_crop.score, 0.5);
    assert_eq!(crop.suggested_crop.region, BoundingBox::new(0.0, 100.0, 600.0, 600.0));
}
