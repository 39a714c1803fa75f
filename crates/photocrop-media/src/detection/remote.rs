//! Provider backed by the hosted prediction API.

use std::sync::Arc;

use async_trait::async_trait;
use photocrop_ml_client::FaceApiClient;
use photocrop_models::{DetectedFace, FaceDetectionOptions};
use tracing::debug;

use super::provider::{FaceDetectionProvider, ProviderImage};
use crate::error::MediaResult;

/// Remote AI face detection.
pub struct RemoteFaceProvider {
    client: Arc<FaceApiClient>,
}

impl RemoteFaceProvider {
    pub fn new(client: Arc<FaceApiClient>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }
}

#[async_trait]
impl FaceDetectionProvider for RemoteFaceProvider {
    async fn detect(
        &self,
        image: &ProviderImage,
        options: &FaceDetectionOptions,
    ) -> MediaResult<Vec<DetectedFace>> {
        let faces = self
            .client
            .detect(&image.bytes, image.mime_type, options.min_confidence)
            .await?;
        debug!(faces = faces.len(), "Remote provider returned faces");
        Ok(faces)
    }

    fn name(&self) -> &'static str {
        "remote"
    }

    fn uses_ai(&self) -> bool {
        true
    }
}
