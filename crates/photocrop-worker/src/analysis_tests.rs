//! Tests for the analysis service.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, Rgb, RgbImage};
use photocrop_media::{
    DetectionCache, FaceDetectionProvider, FaceDetector, MediaResult, ProviderChain,
    ProviderImage,
};
use photocrop_models::{BoundingBox, DetectedFace, FaceDetectionOptions};

use crate::analysis::ImageAnalysisService;
use crate::config::WorkerConfig;
use crate::error::{AnalysisErrorCode, WorkerError};

struct FixedProvider {
    faces: Vec<DetectedFace>,
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl FaceDetectionProvider for FixedProvider {
    async fn detect(
        &self,
        _image: &ProviderImage,
        _options: &FaceDetectionOptions,
    ) -> MediaResult<Vec<DetectedFace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.faces.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn uses_ai(&self) -> bool {
        false
    }
}

fn provider(faces: Vec<DetectedFace>, delay: Duration) -> Arc<FixedProvider> {
    Arc::new(FixedProvider {
        faces,
        delay,
        calls: AtomicUsize::new(0),
    })
}

fn service(primary: Arc<FixedProvider>, config: WorkerConfig) -> ImageAnalysisService {
    let detector = FaceDetector::new(
        ProviderChain::new(primary, provider(vec![], Duration::ZERO)),
        Arc::new(DetectionCache::default()),
    );
    ImageAnalysisService::new(config, detector).unwrap()
}

fn png_data_url(width: u32, height: u32) -> String {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", BASE64.encode(out.into_inner()))
}

#[tokio::test]
async fn test_analyze_with_crop() {
    let face = DetectedFace::new(BoundingBox::new(300.0, 150.0, 120.0, 120.0), 0.9);
    let svc = service(provider(vec![face], Duration::ZERO), WorkerConfig::default());

    let analysis = svc
        .analyze(
            &png_data_url(800, 600),
            &FaceDetectionOptions::default(),
            Some("1:1"),
        )
        .await
        .unwrap();

    assert_eq!(analysis.face_detection.faces.len(), 1);
    assert_eq!(analysis.face_detection.image_width, 800);
    let crop = analysis.crop_suggestion.clone().expect("crop requested");
    assert_eq!(crop.target_aspect_ratio, "1:1");
    assert!(crop.suggested_crop.includes_faces);
    assert_eq!(
        crop.suggested_crop.region.width,
        crop.suggested_crop.region.height
    );

    let again = svc
        .analyze(&png_data_url(800, 600), &FaceDetectionOptions::default(), None)
        .await
        .unwrap();
    assert!(again.face_detection.cached);
    assert_ne!(again.request_id, analysis.request_id);
    let json = serde_json::to_value(&again).unwrap();
    assert!(json.get("cropSuggestion").is_none());
}

#[tokio::test]
async fn test_invalid_ratio_rejected_before_detection() {
    let primary = provider(vec![], Duration::ZERO);
    let svc = service(primary.clone(), WorkerConfig::default());

    let err = svc
        .analyze(
            &png_data_url(50, 50),
            &FaceDetectionOptions::default(),
            Some("16"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCode::InvalidImage);
    assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_detection_timeout() {
    let config = WorkerConfig {
        detection_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let svc = service(provider(vec![], Duration::from_secs(5)), config);

    let err = svc
        .analyze(&png_data_url(40, 40), &FaceDetectionOptions::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Timeout(_)));
    assert_eq!(err.code().as_str(), "TIMEOUT");
}

#[tokio::test]
async fn test_non_image_source_rejected() {
    let svc = service(provider(vec![], Duration::ZERO), WorkerConfig::default());
    let source = format!("data:image/png;base64,{}", BASE64.encode(b"not an image"));

    let err = svc
        .analyze(&source, &FaceDetectionOptions::default(), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCode::InvalidImage);
}

#[tokio::test]
async fn test_suggest_crops() {
    let svc = service(provider(vec![], Duration::ZERO), WorkerConfig::default());

    let result = svc.suggest_crops(&png_data_url(300, 200), &[]).await.unwrap();
    assert_eq!(result.crops.len(), 3);

    let err = svc
        .suggest_crops(&png_data_url(300, 200), &["4:5".to_string(), "x".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCode::InvalidImage);
}
