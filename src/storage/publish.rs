//! Publication writer for the current quiz document

use std::fs;
use std::io;
use std::path::PathBuf;

use super::write_atomic;
use crate::config::OutputConfig;
use crate::models::DatedContentSet;
use crate::utils::error::{ArchiveError, WriteError};

/// Serialize a set the way it is published (pretty, 2-space indent)
pub fn to_document(set: &DatedContentSet) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(set)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes and reads `quiz-data.json`
pub struct PublicationWriter {
    web_root: PathBuf,
    path: PathBuf,
}

impl PublicationWriter {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            web_root: output.web_root.clone(),
            path: output.published_path(),
        }
    }

    /// Path of the published document
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Atomically replace the published document
    ///
    /// # Errors
    ///
    /// Returns `WriteError` if the set cannot be serialized or the file cannot
    /// be written. The previous document is left intact in that case.
    pub fn publish(&self, set: &DatedContentSet) -> Result<PathBuf, WriteError> {
        let bytes = to_document(set)?;

        fs::create_dir_all(&self.web_root).map_err(|source| WriteError::Io {
            path: self.web_root.clone(),
            source,
        })?;
        write_atomic(&self.path, &bytes).map_err(|source| WriteError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            path = %self.path.display(),
            date = %set.date,
            assets = set.asset_count(),
            "Published quiz data"
        );

        Ok(self.path.clone())
    }

    /// Read the published document, if there is one
    pub fn load_current(&self) -> Result<Option<DatedContentSet>, ArchiveError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ArchiveError::io("read", &self.path, e)),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }
}
