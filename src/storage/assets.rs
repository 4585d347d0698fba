//! Idempotent asset cache
//!
//! An asset is identified by a logical key and stored at
//! `<web_root>/<images_dir>/<key>.png`. If the file exists the producer is
//! never called, which makes a re-run after a crash (or a second run on the
//! same day) cheap: only missing assets are rendered.

use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;

use super::write_atomic;
use crate::config::OutputConfig;
use crate::utils::error::{CacheError, RenderError};
use crate::utils::{format_bytes, is_valid_key};

/// How an asset was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// The file already existed
    Cached,
    /// The producer was called and the result stored
    Rendered,
}

/// A stored asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Reference relative to the web root, as published
    pub reference: String,
    pub status: AssetStatus,
}

/// Key-addressed image store with at-most-once generation per run
pub struct AssetCache {
    images_path: PathBuf,
    images_dir: String,
    attempted: Mutex<HashSet<String>>,
}

impl AssetCache {
    /// Cache rooted at the configured image directory
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            images_path: output.images_path(),
            images_dir: output.images_dir.clone(),
            attempted: Mutex::new(HashSet::new()),
        }
    }

    /// Published reference for a key
    pub fn reference(&self, key: &str) -> String {
        format!("{}/{key}.png", self.images_dir)
    }

    /// Filesystem path for a key
    pub fn path(&self, key: &str) -> PathBuf {
        self.images_path.join(format!("{key}.png"))
    }

    /// Whether an asset for `key` is already stored
    pub fn contains(&self, key: &str) -> bool {
        is_valid_key(key) && self.path(key).is_file()
    }

    /// Return the asset for `key`, producing it only if it is missing
    ///
    /// # Errors
    ///
    /// - `CacheError::InvalidKey` for keys that are not plain file stems
    /// - `CacheError::AlreadyAttempted` if this key was already produced (or
    ///   failed) earlier in the run
    /// - `CacheError::Render` if the producer failed
    /// - `CacheError::EmptyImage` if the producer returned no bytes
    /// - `CacheError::Io` if the bytes could not be stored
    pub async fn ensure<F, Fut>(&self, key: &str, producer: F) -> Result<Asset, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, RenderError>>,
    {
        if !is_valid_key(key) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }

        let path = self.path(key);
        let reference = self.reference(key);

        if path.is_file() {
            tracing::info!(asset = key, "Asset exists, skipping");
            return Ok(Asset {
                reference,
                status: AssetStatus::Cached,
            });
        }

        if !self.mark_attempted(key) {
            return Err(CacheError::AlreadyAttempted {
                key: key.to_string(),
            });
        }

        let bytes = producer().await?;
        if bytes.is_empty() {
            return Err(CacheError::EmptyImage {
                key: key.to_string(),
            });
        }

        fs::create_dir_all(&self.images_path).map_err(|source| CacheError::Io {
            path: self.images_path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            asset = key,
            size = %format_bytes(bytes.len() as u64),
            "Asset stored"
        );

        Ok(Asset {
            reference,
            status: AssetStatus::Rendered,
        })
    }

    /// Record an attempt; false if the key was already attempted
    fn mark_attempted(&self, key: &str) -> bool {
        self.attempted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string())
    }
}
