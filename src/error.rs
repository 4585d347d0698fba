//! Unified error handling for the newsquiz crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while keeping the domain errors usable on
//! their own inside each component.
//!
//! # Architecture
//!
//! - [`NewsquizErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Fatal vs non-fatal
//!
//! Only a failure to persist the final document (or to start the run at all)
//! ends a run. Render, fetch and archive failures are logged where they happen
//! and the run continues with less content.

use std::io;
use thiserror::Error;

pub use crate::utils::error::{
    ArchiveError, BackendError, CacheError, CatalogError, FetchError, RenderError, WriteError,
};

/// Common trait for all newsquiz error types
pub trait NewsquizErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later run could succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Image backend errors
    Render,
    /// Feed and other network errors
    Network,
    /// Archive rotation errors
    Archive,
    /// Storage and I/O errors
    Storage,
    /// Configuration and catalog errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Network => "network",
            Self::Archive => "archive",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the newsquiz crate
#[derive(Error, Debug)]
pub enum Error {
    /// All render backends failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Asset cache errors
    #[error("Asset error: {0}")]
    Cache(#[from] CacheError),

    /// "On this day" feed errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Archive rotation errors
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Final document could not be written
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl NewsquizErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Render(e) => !e.is_unconfigured(),
            Self::Cache(CacheError::Render(e)) => !e.is_unconfigured(),
            Self::Cache(_) => true,
            Self::Fetch(e) => !matches!(e, FetchError::InvalidDate { .. }),
            Self::Archive(_) => true,
            Self::Write(_) => true,
            Self::Io(_) => true,
            Self::Catalog(_) | Self::Json(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Render(_) | Self::Cache(CacheError::Render(_)) => ErrorCategory::Render,
            Self::Cache(_) | Self::Write(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Archive(_) => ErrorCategory::Archive,
            Self::Catalog(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Json(_) => ErrorCategory::Storage,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error ends the run
    ///
    /// Per-asset render failures, feed failures and archive failures are
    /// absorbed at their boundary; anything that prevents the published
    /// document from being written is fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Render(_) | Self::Cache(_) | Self::Fetch(_) | Self::Archive(_) => false,
            Self::Write(_)
            | Self::Catalog(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other { .. } => true,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
