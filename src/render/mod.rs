//! Image rendering backends and the fallback chain
//!
//! Every generative image service is reached through one capability,
//! [`ImageBackend::render`]. A [`BackendChain`] holds an ordered list of
//! backends and tries them in turn until one returns image bytes.
//!
//! # Failure policy
//!
//! - A backend without credentials fails immediately, without a network call
//! - Any other failure (transport, status, malformed response, timeout) is
//!   logged and the next backend is tried
//! - The chain never retries a backend; polling that a backend's own protocol
//!   requires happens inside that backend
//! - Only when every backend failed does the caller see a [`RenderError`]
//!
//! # Example
//!
//! ```no_run
//! use newsquiz::config::RenderConfig;
//! use newsquiz::render::RenderBackends;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let backends = RenderBackends::from_config(&RenderConfig::default())?;
//! let png = backends.art.render("A lighthouse in a storm").await?;
//! println!("{} bytes", png.len());
//! # Ok(())
//! # }
//! ```

pub mod openai;
pub mod replicate;

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendKind, RenderConfig};
use crate::utils::error::{BackendError, BackendFailure, RenderError};
use crate::utils::format_bytes;

pub use openai::OpenAiBackend;
pub use replicate::ReplicateBackend;

/// A generative image service
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Render a prompt to encoded image bytes
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, BackendError>;
}

/// Ordered list of backends tried until one succeeds
#[derive(Clone)]
pub struct BackendChain {
    backends: Vec<Arc<dyn ImageBackend>>,
}

impl BackendChain {
    /// Create a chain from backends in priority order
    pub fn new(backends: Vec<Arc<dyn ImageBackend>>) -> Self {
        Self { backends }
    }

    /// Names of the backends in priority order
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Number of backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the chain has no backends
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Render a prompt with the first backend that succeeds
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Exhausted` with every backend's failure if none
    /// succeeded, or `RenderError::NoBackends` for an empty chain.
    pub async fn render(&self, prompt: &str) -> Result<Vec<u8>, RenderError> {
        if self.backends.is_empty() {
            return Err(RenderError::NoBackends);
        }

        let mut failures = Vec::new();

        for backend in &self.backends {
            match backend.render(prompt).await {
                Ok(bytes) => {
                    tracing::debug!(
                        backend = backend.name(),
                        size = %format_bytes(bytes.len() as u64),
                        "Backend rendered image"
                    );
                    return Ok(bytes);
                }
                Err(e) if e.is_missing_credentials() => {
                    tracing::warn!(
                        backend = backend.name(),
                        "Backend credentials not configured, falling through"
                    );
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        error: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        backend = backend.name(),
                        transient = e.is_transient(),
                        error = %e,
                        "Backend failed, falling through"
                    );
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        error: e,
                    });
                }
            }
        }

        Err(RenderError::Exhausted { failures })
    }
}

/// The two chains a run needs
#[derive(Clone)]
pub struct RenderBackends {
    /// News items and collages
    pub news: BackendChain,
    /// History and "on this day" artwork
    pub art: BackendChain,
}

impl RenderBackends {
    /// Build both chains from configuration
    ///
    /// Each backend is created once and shared by the chains that list it.
    pub fn from_config(config: &RenderConfig) -> Result<Self, BackendError> {
        let openai: Arc<dyn ImageBackend> = Arc::new(OpenAiBackend::new(config)?);
        let replicate: Arc<dyn ImageBackend> = Arc::new(ReplicateBackend::new(config)?);

        let pick = |kinds: &[BackendKind]| {
            BackendChain::new(
                kinds
                    .iter()
                    .map(|kind| match kind {
                        BackendKind::OpenAi => Arc::clone(&openai),
                        BackendKind::Replicate => Arc::clone(&replicate),
                    })
                    .collect(),
            )
        };

        Ok(Self {
            news: pick(&config.news_chain),
            art: pick(&config.art_chain),
        })
    }
}

/// Download a rendered image
pub(crate) async fn download(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, BackendError> {
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(BackendError::Malformed(format!("empty image at {url}")));
    }

    Ok(bytes.to_vec())
}

/// Turn a non-success response into a `BackendError::Status`
pub(crate) async fn status_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Status { status, body }
}
