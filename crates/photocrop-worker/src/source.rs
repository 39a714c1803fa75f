//! Loading image bytes from the sources callers may pass.
//!
//! Accepted forms:
//! - `data:image/<type>;base64,<payload>`
//! - `http://` or `https://` URLs
//! - a local file path (used by tooling)

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use photocrop_media::MediaError;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    DataUrl(String),
    Http(String),
    File(PathBuf),
}

impl ImageSource {
    /// Classify a source string. Blank input is rejected.
    pub fn parse(source: &str) -> WorkerResult<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(WorkerError::invalid_source("image cannot be empty"));
        }
        if source.starts_with("data:image/") {
            return Ok(Self::DataUrl(source.to_string()));
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(Self::Http(source.to_string()));
        }
        if source.starts_with("data:") || source.contains("://") {
            return Err(WorkerError::invalid_source(
                "Invalid image: must be a URL or base64 data",
            ));
        }
        Ok(Self::File(PathBuf::from(source)))
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::DataUrl(_) => "data_url",
            ImageSource::Http(_) => "http",
            ImageSource::File(_) => "file",
        }
    }
}

/// Decode the base64 payload of a `data:image/...` URL.
pub fn decode_data_url(data_url: &str) -> WorkerResult<Vec<u8>> {
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload.trim())
        .filter(|payload| !payload.is_empty())
        .ok_or_else(|| WorkerError::invalid_source("Invalid base64 image data"))?;

    BASE64
        .decode(payload)
        .map_err(|e| WorkerError::invalid_source(format!("Invalid base64 image data: {}", e)))
}

/// Fetches image bytes with a size limit.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    http: reqwest::Client,
    max_size: usize,
}

impl SourceLoader {
    pub fn new(fetch_timeout: Duration, max_size: usize) -> WorkerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("HTTP client: {}", e)))?;
        Ok(Self { http, max_size })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub async fn load_str(&self, source: &str) -> WorkerResult<Vec<u8>> {
        self.load(&ImageSource::parse(source)?).await
    }

    /// Load the bytes of `source`, rejecting anything over the size limit.
    pub async fn load(&self, source: &ImageSource) -> WorkerResult<Vec<u8>> {
        let bytes = match source {
            ImageSource::DataUrl(url) => decode_data_url(url)?,
            ImageSource::Http(url) => self.fetch(url).await?,
            ImageSource::File(path) => self.read_file(path).await?,
        };
        self.check_size(bytes.len())?;
        debug!(kind = source.kind(), bytes = bytes.len(), "Loaded image source");
        Ok(bytes)
    }

    async fn fetch(&self, url: &str) -> WorkerResult<Vec<u8>> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WorkerError::invalid_source(format!("Failed to fetch image: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::invalid_source(format!(
                "Failed to fetch image: {}",
                status.as_u16()
            )));
        }
        if let Some(len) = response.content_length() {
            self.check_size(len as usize)?;
        }

        // Bodies without a length header are bounded while streaming.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| WorkerError::invalid_source(format!("Failed to read image: {}", e)))?
        {
            self.check_size(body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    async fn read_file(&self, path: &Path) -> WorkerResult<Vec<u8>> {
        let len = tokio::fs::metadata(path).await?.len();
        self.check_size(len as usize)?;
        Ok(tokio::fs::read(path).await?)
    }

    fn check_size(&self, size: usize) -> WorkerResult<()> {
        if size > self.max_size {
            return Err(MediaError::FileTooLarge {
                size,
                max: self.max_size,
            }
            .into());
        }
        Ok(())
    }
}
