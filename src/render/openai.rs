//! OpenAI Images backend (DALL-E 3)
//!
//! Requests one image per prompt and downloads it from the URL the API
//! returns.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{download, status_error, ImageBackend};
use crate::config::RenderConfig;
use crate::utils::error::BackendError;

/// Image generation request
#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
    response_format: &'a str,
}

/// Image generation response
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

/// OpenAI Images API client
pub struct OpenAiBackend {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    size: String,
    quality: String,
    download_timeout: Duration,
}

impl OpenAiBackend {
    /// Create a backend from configuration
    ///
    /// A missing API key is not an error here; `render` reports it.
    pub fn new(config: &RenderConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            size: config.openai_size.clone(),
            quality: config.openai_quality.clone(),
            download_timeout: config.download_timeout(),
        })
    }

    fn generations_url(&self) -> String {
        format!("{}/v1/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn render(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BackendError::MissingCredentials { backend: "openai" })?;

        let request = GenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            quality: &self.quality,
            response_format: "url",
        };

        tracing::debug!(model = %self.model, "Requesting OpenAI image");

        let response = self
            .client
            .post(self.generations_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| BackendError::Malformed("response has no image url".to_string()))?;

        download(&self.client, &url, self.download_timeout).await
    }
}
