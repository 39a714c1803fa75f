//! Combined analysis: load, validate, detect faces, suggest a crop.

use std::time::Instant;

use photocrop_media::{
    calculate_optimal_crop, parse_aspect_ratio, validate_image_format, FaceDetector, MediaError,
    SmartCropAdvisor,
};
use photocrop_models::{
    CropCalculatorOptions, FaceDetectionOptions, ImageAnalysis, SmartCropOptions,
    SmartCropResult,
};
use tracing::{info, Instrument};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::OperationLogger;
use crate::source::SourceLoader;

/// Entry point used by product flows.
#[derive(Clone)]
pub struct ImageAnalysisService {
    config: WorkerConfig,
    detector: FaceDetector,
    advisor: SmartCropAdvisor,
    loader: SourceLoader,
}

impl ImageAnalysisService {
    pub fn new(config: WorkerConfig, detector: FaceDetector) -> WorkerResult<Self> {
        let loader = SourceLoader::new(config.fetch_timeout, config.max_image_size)?;
        Ok(Self {
            config,
            detector,
            advisor: SmartCropAdvisor::default(),
            loader,
        })
    }

    /// Build the service from environment configuration.
    pub fn from_env() -> WorkerResult<Self> {
        let detector = FaceDetector::from_env()?;
        Self::new(WorkerConfig::from_env(), detector)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn detector(&self) -> &FaceDetector {
        &self.detector
    }

    /// Analyze an image given as a data URL, `http(s)` URL or file path.
    pub async fn analyze(
        &self,
        source: &str,
        options: &FaceDetectionOptions,
        aspect_ratio: Option<&str>,
    ) -> WorkerResult<ImageAnalysis> {
        if let Some(ratio) = aspect_ratio {
            parse_aspect_ratio(ratio).map_err(MediaError::from)?;
        }
        let buffer = self.loader.load_str(source).await?;
        self.analyze_bytes(&buffer, options, aspect_ratio).await
    }

    /// Analyze already-loaded image bytes.
    ///
    /// Detection runs under the configured timeout. A failed crop
    /// calculation is logged and leaves `crop_suggestion` empty.
    pub async fn analyze_bytes(
        &self,
        buffer: &[u8],
        options: &FaceDetectionOptions,
        aspect_ratio: Option<&str>,
    ) -> WorkerResult<ImageAnalysis> {
        let logger = OperationLogger::new("analyze");
        let start = Instant::now();

        if buffer.len() > self.config.max_image_size {
            return Err(MediaError::FileTooLarge {
                size: buffer.len(),
                max: self.config.max_image_size,
            }
            .into());
        }
        let validation = validate_image_format(buffer);
        if !validation.valid {
            let message = validation
                .error
                .unwrap_or_else(|| "Invalid image format".to_string());
            logger.log_warning(&message);
            return Err(WorkerError::invalid_source(message));
        }

        logger.log_start(&format!("{} bytes", buffer.len()));
        let detection = tokio::time::timeout(
            self.config.detection_timeout,
            self.detector
                .detect_faces(buffer, options)
                .instrument(logger.create_span()),
        )
        .await
        .map_err(|_| {
            logger.log_error("face detection timed out");
            WorkerError::Timeout(self.config.detection_timeout)
        })??;

        let face_count = detection.faces.len();
        let detection_ms = detection.processing_time_ms;
        let mut analysis = ImageAnalysis::new(logger.request_id(), detection);

        if let Some(ratio) = aspect_ratio {
            let crop_options = CropCalculatorOptions::with_aspect_ratio(ratio);
            match calculate_optimal_crop(
                analysis.face_detection.image_width,
                analysis.face_detection.image_height,
                &analysis.face_detection.faces,
                &crop_options,
            ) {
                Ok(crop) => analysis = analysis.with_crop(crop),
                Err(e) => logger.log_error(&format!("crop calculation failed: {}", e)),
            }
        }

        info!(
            request_id = %logger.request_id(),
            faces = face_count,
            detection_ms,
            total_ms = start.elapsed().as_millis() as u64,
            cached = analysis.face_detection.cached,
            "Image analysis complete"
        );
        logger.log_completion(&format!("{} faces", face_count));
        Ok(analysis)
    }

    /// Saliency crop suggestions for each ratio. Every ratio must parse.
    pub async fn suggest_crops(
        &self,
        source: &str,
        aspect_ratios: &[String],
    ) -> WorkerResult<SmartCropResult> {
        for ratio in aspect_ratios {
            parse_aspect_ratio(ratio).map_err(MediaError::from)?;
        }
        let buffer = self.loader.load_str(source).await?;
        let options = if aspect_ratios.is_empty() {
            SmartCropOptions::default()
        } else {
            SmartCropOptions {
                aspect_ratios: aspect_ratios.to_vec(),
            }
        };
        Ok(self.advisor.get_suggested_crops(&buffer, &options).await?)
    }
}
