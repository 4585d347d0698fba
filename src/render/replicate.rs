//! Replicate predictions backend (Flux Schnell)
//!
//! Creates a prediction with `Prefer: wait`. If the model has not finished
//! within the synchronous window the prediction is polled at a fixed
//! interval until it reaches a terminal state or the poll budget runs out.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{download, status_error, ImageBackend};
use crate::config::RenderConfig;
use crate::utils::error::BackendError;
use crate::utils::poll::{poll_until, PollConfig, PollStatus};

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    num_outputs: u32,
    aspect_ratio: &'a str,
    output_format: &'a str,
    num_inference_steps: u32,
}

/// Prediction state as returned by create and get
#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    #[serde(default)]
    status: String,
    #[serde(default)]
    urls: Option<PredictionUrls>,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    fn is_running(&self) -> bool {
        matches!(self.status.as_str(), "starting" | "processing")
    }

    /// First output URL; the model returns either a list or a single string
    fn output_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            serde_json::Value::String(url) => Some(url),
            serde_json::Value::Array(items) => items.first()?.as_str(),
            _ => None,
        }
    }

    fn failure_reason(&self) -> String {
        match &self.error {
            Some(serde_json::Value::String(msg)) => format!("{}: {msg}", self.status),
            Some(serde_json::Value::Null) | None => format!("status {}", self.status),
            Some(other) => format!("{}: {other}", self.status),
        }
    }
}

/// Replicate predictions API client
pub struct ReplicateBackend {
    client: Client,
    api_token: Option<String>,
    base_url: String,
    model: String,
    poll: PollConfig,
    poll_timeout: Duration,
    download_timeout: Duration,
}

impl ReplicateBackend {
    /// Create a backend from configuration
    ///
    /// A missing API token is not an error here; `render` reports it.
    pub fn new(config: &RenderConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            api_token: config.replicate_api_token.clone(),
            base_url: config.replicate_base_url.trim_end_matches('/').to_string(),
            model: config.replicate_model.clone(),
            poll: PollConfig::new(
                config.poll_max_attempts,
                Duration::from_secs(config.poll_interval_secs),
            ),
            poll_timeout: config.poll_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    fn predictions_url(&self) -> String {
        format!("{}/v1/models/{}/predictions", self.base_url, self.model)
    }

    async fn create(&self, prompt: &str, token: &str) -> Result<Prediction, BackendError> {
        let request = PredictionRequest {
            input: PredictionInput {
                prompt,
                num_outputs: 1,
                aspect_ratio: "1:1",
                output_format: "png",
                num_inference_steps: 4,
            },
        };

        let response = self
            .client
            .post(self.predictions_url())
            .bearer_auth(token)
            .header("Prefer", "wait")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn fetch(&self, url: &str, token: &str) -> Result<PollStatus<Prediction>, BackendError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.poll_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let prediction: Prediction = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        if prediction.is_running() {
            Ok(PollStatus::Pending)
        } else {
            Ok(PollStatus::Ready(prediction))
        }
    }
}

#[async_trait]
impl ImageBackend for ReplicateBackend {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn render(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or(BackendError::MissingCredentials {
                backend: "replicate",
            })?;

        tracing::debug!(model = %self.model, "Creating Replicate prediction");
        let mut prediction = self.create(prompt, token).await?;

        if prediction.is_running() {
            let get_url = prediction
                .urls
                .as_ref()
                .and_then(|urls| urls.get.clone())
                .ok_or_else(|| {
                    BackendError::Malformed("running prediction has no poll url".to_string())
                })?;

            tracing::debug!(status = %prediction.status, "Prediction still running, polling");

            let get_url = get_url.as_str();
            prediction = poll_until(&self.poll, move || self.fetch(get_url, token))
                .await?
                .ok_or(BackendError::PollExhausted {
                    attempts: self.poll.max_attempts,
                })?;
        }

        if prediction.status != "succeeded" {
            return Err(BackendError::Prediction(prediction.failure_reason()));
        }

        let url = prediction
            .output_url()
            .ok_or_else(|| BackendError::Malformed("prediction has no output url".to_string()))?;

        download(&self.client, url, self.download_timeout).await
    }
}
