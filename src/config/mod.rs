//! Configuration management for the newsquiz generator
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. The resulting [`Config`] is built once at the
//! process boundary and handed to each component at construction; nothing
//! below `main` reads the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Catalog (static content) location
    #[serde(default)]
    pub content: ContentConfig,

    /// Image backend configuration
    #[serde(default)]
    pub render: RenderConfig,

    /// "On this day" feed configuration
    #[serde(default)]
    pub feed: FeedConfig,

    /// Selection sizes and filters
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where published artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Web root that all asset references are relative to
    pub web_root: PathBuf,

    /// Image directory name under the web root
    pub images_dir: String,

    /// Current published document
    pub published_file: String,

    /// Archive index document
    pub archive_index_file: String,

    /// Prefix of dated snapshot documents (`<prefix><date>.json`)
    pub snapshot_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("public"),
            images_dir: String::from("images"),
            published_file: String::from("quiz-data.json"),
            archive_index_file: String::from("archive-index.json"),
            snapshot_prefix: String::from("quiz-data-"),
        }
    }
}

impl OutputConfig {
    /// Absolute (or root-relative) path of the image directory
    pub fn images_path(&self) -> PathBuf {
        self.web_root.join(&self.images_dir)
    }

    /// Path of the current published document
    pub fn published_path(&self) -> PathBuf {
        self.web_root.join(&self.published_file)
    }

    /// Path of the archive index
    pub fn archive_index_path(&self) -> PathBuf {
        self.web_root.join(&self.archive_index_file)
    }

    /// Path of the snapshot for a given date string
    pub fn snapshot_path(&self, date: &str) -> PathBuf {
        self.web_root
            .join(format!("{}{date}.json", self.snapshot_prefix))
    }
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// TOML catalog with news items, collages, history events and styles
    pub catalog_path: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("catalog.toml"),
        }
    }
}

/// Available image backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenAI Images API (DALL-E 3)
    OpenAi,
    /// Replicate predictions API (Flux Schnell)
    Replicate,
}

impl BackendKind {
    /// Backend identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Replicate => "replicate",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "dalle" | "dall-e" => Ok(Self::OpenAi),
            "replicate" | "flux" => Ok(Self::Replicate),
            other => anyhow::bail!("Unknown backend '{other}'"),
        }
    }
}

/// Parse a comma-separated backend list
pub fn parse_chain(value: &str) -> Result<Vec<BackendKind>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(BackendKind::from_str)
        .collect()
}

/// Image backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// OpenAI API key (never serialized)
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    pub openai_base_url: String,

    /// OpenAI image model
    pub openai_model: String,

    /// Requested image size
    pub openai_size: String,

    /// Requested image quality
    pub openai_quality: String,

    /// Replicate API token (never serialized)
    #[serde(skip_serializing)]
    pub replicate_api_token: Option<String>,

    /// Replicate API base URL
    pub replicate_base_url: String,

    /// Replicate model (`owner/name`)
    pub replicate_model: String,

    /// Timeout for generation requests in seconds
    pub request_timeout_secs: u64,

    /// Timeout for image downloads in seconds
    pub download_timeout_secs: u64,

    /// Delay between prediction polls in seconds
    pub poll_interval_secs: u64,

    /// Timeout for a single prediction poll in seconds
    pub poll_timeout_secs: u64,

    /// Maximum prediction polls
    pub poll_max_attempts: u32,

    /// Backend order for news items and collages
    pub news_chain: Vec<BackendKind>,

    /// Backend order for history and "on this day" artwork
    pub art_chain: Vec<BackendKind>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: String::from("https://api.openai.com"),
            openai_model: String::from("dall-e-3"),
            openai_size: String::from("1024x1024"),
            openai_quality: String::from("standard"),
            replicate_api_token: None,
            replicate_base_url: String::from("https://api.replicate.com"),
            replicate_model: String::from("black-forest-labs/flux-schnell"),
            request_timeout_secs: 90,
            download_timeout_secs: 60,
            poll_interval_secs: 3,
            poll_timeout_secs: 30,
            poll_max_attempts: 30,
            news_chain: vec![BackendKind::OpenAi],
            art_chain: vec![BackendKind::Replicate, BackendKind::OpenAi],
        }
    }
}

impl RenderConfig {
    /// Fill missing credentials from the standard environment variables
    pub fn apply_env_credentials(&mut self) {
        if self.openai_api_key.is_none() {
            self.openai_api_key = non_empty_env("OPENAI_API_KEY");
        }
        if self.replicate_api_token.is_none() {
            self.replicate_api_token = non_empty_env("REPLICATE_API_TOKEN");
        }
    }

    /// Generation request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Image download timeout
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Timeout for one prediction poll
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// "On this day" feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Whether to build the "on this day" section at all
    pub enabled: bool,

    /// Feed API base URL
    pub base_url: String,

    /// Wikipedia language edition
    pub language: String,

    /// User agent sent to the feed
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::from("https://api.wikimedia.org"),
            language: String::from("en"),
            user_agent: format!("newsquiz/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 15,
        }
    }
}

impl FeedConfig {
    /// Request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Selection sizes and filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Rendered history events per day
    pub history_featured: usize,

    /// Text-only history decoys per day
    pub history_distractors: usize,

    /// Rendered "on this day" events per day
    pub on_this_day_featured: usize,

    /// Text-only "on this day" decoys per day
    pub on_this_day_distractors: usize,

    /// Earliest feed year considered
    pub min_year: i32,

    /// Latest feed year considered
    pub max_year: i32,

    /// Maximum headline length for feed events
    pub headline_max_chars: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            history_featured: 4,
            history_distractors: 4,
            on_this_day_featured: 4,
            on_this_day_distractors: 4,
            min_year: 500,
            max_year: 2020,
            headline_max_chars: 100,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(root) = non_empty_env("NEWSQUIZ_WEB_ROOT") {
            config.output.web_root = PathBuf::from(root);
        }
        if let Some(catalog) = non_empty_env("NEWSQUIZ_CATALOG") {
            config.content.catalog_path = PathBuf::from(catalog);
        }

        config.render.apply_env_credentials();
        if let Some(chain) = non_empty_env("NEWSQUIZ_NEWS_CHAIN") {
            config.render.news_chain =
                parse_chain(&chain).context("Invalid NEWSQUIZ_NEWS_CHAIN")?;
        }
        if let Some(chain) = non_empty_env("NEWSQUIZ_ART_CHAIN") {
            config.render.art_chain = parse_chain(&chain).context("Invalid NEWSQUIZ_ART_CHAIN")?;
        }
        if let Some(timeout) = parsed_env("NEWSQUIZ_REQUEST_TIMEOUT") {
            config.render.request_timeout_secs = timeout;
        }

        if let Some(enabled) = parsed_env("NEWSQUIZ_ON_THIS_DAY") {
            config.feed.enabled = enabled;
        }
        if let Some(agent) = non_empty_env("NEWSQUIZ_USER_AGENT") {
            config.feed.user_agent = agent;
        }

        if let Some(level) = non_empty_env("NEWSQUIZ_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = non_empty_env("NEWSQUIZ_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// Credentials are normally kept out of the file; missing ones are taken
    /// from `OPENAI_API_KEY` and `REPLICATE_API_TOKEN`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.render.apply_env_credentials();
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.output.web_root.as_os_str().is_empty() {
            anyhow::bail!("web_root must not be empty");
        }

        for (name, value) in [
            ("images_dir", &self.output.images_dir),
            ("published_file", &self.output.published_file),
            ("archive_index_file", &self.output.archive_index_file),
        ] {
            if value.is_empty() || value.contains('/') || value.contains('\\') {
                anyhow::bail!("{name} must be a plain file or directory name");
            }
        }

        for (name, value) in [
            ("openai_base_url", &self.render.openai_base_url),
            ("replicate_base_url", &self.render.replicate_base_url),
            ("feed base_url", &self.feed.base_url),
        ] {
            let parsed =
                Url::parse(value).with_context(|| format!("{name} is not a valid URL: {value}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("{name} must use http or https: {value}");
            }
        }

        if self.render.news_chain.is_empty() || self.render.art_chain.is_empty() {
            anyhow::bail!("backend chains must not be empty");
        }

        if self.render.poll_max_attempts == 0 {
            anyhow::bail!("poll_max_attempts must be greater than 0");
        }

        if self.selection.min_year > self.selection.max_year {
            anyhow::bail!("min_year must not exceed max_year");
        }

        if self.selection.headline_max_chars < 4 {
            anyhow::bail!("headline_max_chars must be at least 4");
        }

        Ok(())
    }
}
