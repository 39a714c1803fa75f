//! Face API HTTP client.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use photocrop_models::DetectedFace;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::error::{MlError, MlResult};
use crate::poll::PollPolicy;
use crate::types::{Prediction, PredictionInput, PredictionRequest, PredictionStatus};

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Face detection model version used when none is configured.
pub const DEFAULT_MODEL_VERSION: &str =
    "a8c5b9c7d9e1a4f3b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0";

/// Configuration for the face API client.
#[derive(Debug, Clone)]
pub struct FaceApiConfig {
    /// Base URL of the prediction service
    pub base_url: String,
    /// Bearer token; `None` leaves the client unconfigured
    pub api_token: Option<String>,
    pub model_version: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Max retries for prediction creation
    pub max_retries: u32,
    pub poll: PollPolicy,
}

impl Default for FaceApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
            poll: PollPolicy::default(),
        }
    }
}

impl FaceApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let api_token = std::env::var("FACE_API_TOKEN")
            .or_else(|_| std::env::var("REPLICATE_API_KEY"))
            .ok()
            .filter(|t| !t.trim().is_empty());

        Self {
            base_url: std::env::var("FACE_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_token,
            model_version: std::env::var("FACE_API_MODEL_VERSION")
                .unwrap_or_else(|_| DEFAULT_MODEL_VERSION.to_string()),
            timeout: Duration::from_secs(
                std::env::var("FACE_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("FACE_API_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            poll: PollPolicy::from_env(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

/// Client for the remote face-detection prediction service.
pub struct FaceApiClient {
    http: Client,
    config: FaceApiConfig,
}

impl FaceApiClient {
    /// Create a new client.
    pub fn new(config: FaceApiConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(FaceApiConfig::from_env())
    }

    pub fn config(&self) -> &FaceApiConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn token(&self) -> MlResult<&str> {
        self.config
            .api_token
            .as_deref()
            .ok_or_else(|| MlError::NotConfigured("FACE_API_TOKEN is not set".to_string()))
    }

    /// Detect faces in an encoded image.
    ///
    /// Creates a prediction, waits for it under the poll policy and converts
    /// the output into faces in the coordinate space of `image`. The poll
    /// deadline covers the whole call.
    pub async fn detect(
        &self,
        image: &[u8],
        mime_type: &str,
        min_confidence: f64,
    ) -> MlResult<Vec<DetectedFace>> {
        self.token()?;

        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(image));
        let deadline = self.config.poll.deadline;
        let finished = tokio::time::timeout(deadline, async {
            let created = self.create_prediction(data_url, min_confidence).await?;
            self.poll_until_finished(created).await
        })
        .await
        .map_err(|_| deadline_exceeded(deadline))??;

        finished
            .faces()?
            .into_iter()
            .map(DetectedFace::try_from)
            .collect()
    }

    /// Create a prediction.
    pub async fn create_prediction(
        &self,
        image_data_url: String,
        min_confidence: f64,
    ) -> MlResult<Prediction> {
        let token = self.token()?;
        let url = format!("{}/v1/predictions", self.config.base_url.trim_end_matches('/'));
        let request = PredictionRequest {
            version: self.config.model_version.clone(),
            input: PredictionInput {
                image: image_data_url,
                min_confidence,
            },
        };

        debug!(url = %url, "Creating face detection prediction");

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(token)
                    .json(&request)
                    .send()
                    .await
                    .map_err(MlError::Network)?;
                check_status(response).await
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Fetch the current state of a prediction.
    pub async fn get_prediction(&self, status_url: &str) -> MlResult<Prediction> {
        let token = self.token()?;
        let response = self
            .http
            .get(status_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(MlError::Network)?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Poll until the prediction succeeds, fails, or the deadline passes.
    ///
    /// The deadline bounds the whole wait, including in-flight status
    /// requests.
    pub async fn wait_for(&self, prediction: Prediction) -> MlResult<Prediction> {
        let deadline = self.config.poll.deadline;
        let prediction_id = prediction.id.clone();
        tokio::time::timeout(deadline, self.poll_until_finished(prediction))
            .await
            .map_err(|_| {
                debug!(prediction_id = %prediction_id, "Poll deadline reached");
                deadline_exceeded(deadline)
            })?
    }

    async fn poll_until_finished(&self, prediction: Prediction) -> MlResult<Prediction> {
        let interval = self.config.poll.interval;
        let mut current = prediction;

        loop {
            match current.status {
                PredictionStatus::Succeeded => return Ok(current),
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    return Err(MlError::PredictionFailed {
                        status: current.status.as_str().to_string(),
                        message: current.error_message(),
                    });
                }
                PredictionStatus::Starting | PredictionStatus::Processing => {}
            }

            tokio::time::sleep(interval).await;

            let status_url = current.status_url()?.to_string();
            current = self.get_prediction(&status_url).await?;
            debug!(
                prediction_id = %current.id,
                status = current.status.as_str(),
                "Polled prediction"
            );
        }
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Face API request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MlError::RequestFailed("Unknown error".to_string())))
    }
}

fn deadline_exceeded(deadline: Duration) -> MlError {
    warn!(
        deadline_ms = deadline.as_millis() as u64,
        "Face detection prediction timed out"
    );
    MlError::Timeout(deadline)
}

async fn check_status(response: Response) -> MlResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(MlError::HttpStatus { status, body })
}
