//! Error types for the newsquiz generator
//!
//! This module defines the domain error types used throughout the application.
//! Each boundary of a run owns one of them, and the pipeline decides which
//! ones are fatal (see [`crate::error::Error::is_fatal`]).

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a single render backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend needs credentials that are not configured
    #[error("{backend} credentials are not configured")]
    MissingCredentials { backend: &'static str },

    /// HTTP transport error (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The remote job finished without producing an image
    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// The remote job was still running after the last poll
    #[error("Still processing after {attempts} polls")]
    PollExhausted { attempts: u32 },
}

impl BackendError {
    /// Whether the failure happened before any network call was made
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, Self::MissingCredentials { .. })
    }

    /// Whether a later invocation could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MissingCredentials { .. } => false,
            Self::Http(_) | Self::PollExhausted { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) | Self::Prediction(_) => false,
        }
    }
}

/// One backend's failure inside a fallback chain
#[derive(Debug)]
pub struct BackendFailure {
    /// Backend name
    pub backend: String,

    /// What went wrong
    pub error: BackendError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

fn join_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every backend of a fallback chain failed
#[derive(Error, Debug)]
pub enum RenderError {
    /// All configured backends were tried and failed
    #[error("All render backends failed: {}", join_failures(.failures))]
    Exhausted { failures: Vec<BackendFailure> },

    /// The chain has no backends
    #[error("No render backends configured")]
    NoBackends,
}

impl RenderError {
    /// Whether every backend failed only for lack of credentials
    pub fn is_unconfigured(&self) -> bool {
        match self {
            Self::Exhausted { failures } => {
                failures.iter().all(|f| f.error.is_missing_credentials())
            }
            Self::NoBackends => true,
        }
    }
}

/// Errors from the "on this day" feed
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Feed body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Month/day out of range
    #[error("Invalid date: {month:02}/{day:02}")]
    InvalidDate { month: u32, day: u32 },
}

/// Filesystem failure while rotating the previous day's set
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error on a specific path
    #[error("Failed to {operation} {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Published or index document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The published document carries an unusable date
    #[error("Invalid published date: {0}")]
    InvalidDate(String),
}

impl ArchiveError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// The final document could not be persisted
#[derive(Error, Debug)]
pub enum WriteError {
    /// I/O error on a specific path
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the idempotent asset cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// The producer failed
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// Persisting the produced bytes failed
    #[error("Failed to store asset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A generation attempt for this key already failed in this run
    #[error("Asset {key} was already attempted in this run")]
    AlreadyAttempted { key: String },

    /// The key cannot be turned into a file name
    #[error("Invalid asset key: {0:?}")]
    InvalidKey(String),

    /// The producer returned no bytes
    #[error("Producer returned an empty image for {key}")]
    EmptyImage { key: String },
}

/// Errors loading the static content catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Catalog file is not valid TOML for the schema
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    /// The same id appears twice in one table
    #[error("Duplicate id '{id}' in {table}")]
    DuplicateId { table: String, id: String },

    /// An id that cannot be used as an asset key
    #[error("Invalid id '{id}' in {table}")]
    InvalidId { table: String, id: String },

    /// Table keyed by something other than a curated category
    #[error("Unknown curated category '{0}'")]
    UnknownCategory(String),

    /// History events exist but no art styles are defined
    #[error("Catalog has history events but no art styles")]
    MissingStyles,
}
