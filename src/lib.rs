//! newsquiz - Daily content orchestrator for a news and history image quiz
//!
//! Builds one reproducible quiz per calendar date: curated news headlines,
//! events drawn from a historical pool, a live "on this day" section and
//! per-category collages, each paired with an image from a generative
//! backend. The result is published as JSON plus image files under a web root.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`catalog`] - Static content (news items, history pool, art styles)
//! - [`selection`] - Date-seeded random stream and event selection
//! - [`render`] - Image backends and the fallback chain
//! - [`feed`] - "On this day" event feed client
//! - [`storage`] - Asset cache, archive rotation and publication
//! - [`pipeline`] - The orchestrator tying one run together
//! - [`models`] - Published document structures
//! - [`error`] - Unified error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use newsquiz::catalog::Catalog;
//! use newsquiz::config::Config;
//! use newsquiz::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let catalog = Catalog::from_file(&config.content.catalog_path)?;
//!     let pipeline = Pipeline::from_config(config, catalog)?;
//!     let today = chrono::Local::now().date_naive();
//!     pipeline.run(today).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod selection;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, NewsquizErrorTrait, Result};
    pub use crate::feed::{EventFeed, FeedEvent, WikimediaFeed};
    pub use crate::models::{CategoryKey, DatedContentSet, DistractorItem, FeaturedItem};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, RunReport};
    pub use crate::render::{BackendChain, ImageBackend, RenderBackends};
    pub use crate::selection::{EventSelector, SeedState};
    pub use crate::storage::{ArchiveRotation, AssetCache, PublicationWriter};
}

// Direct re-exports for convenience
pub use models::{CategoryKey, DatedContentSet, FeaturedItem};
