//! Archive rotation of the previously published day
//!
//! At the start of a run the published document is inspected. If it belongs to
//! an earlier date it is rotated into cold storage:
//!
//! 1. every referenced asset is copied to `images/<old_date>/`
//! 2. the references in the document are rewritten to the archived copies
//! 3. the document is written as `quiz-data-<old_date>.json` (an existing
//!    snapshot is never overwritten)
//! 4. the flat originals are removed
//! 5. the old date is prepended to `archive-index.json`
//!
//! The index entry is written last and marks the rotation as complete. A run
//! killed after that point, but before it published, leaves the old document
//! in place; the next rotation sees the index entry and touches nothing, so
//! assets the killed run already rendered for today survive.
//!
//! A rotation interrupted before the index entry is repeated. An archived copy
//! is never overwritten, and a flat file is only removed when it is
//! byte-identical to its archived copy.

use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::publish::{to_document, PublicationWriter};
use super::write_atomic;
use crate::config::OutputConfig;
use crate::utils::error::ArchiveError;

/// Archived dates, most recent first, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    dates: Vec<NaiveDate>,
}

impl ArchiveIndex {
    /// Load the index; a missing file is an empty index
    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ArchiveError::io("read", path, e)),
        };

        let raw: Vec<String> = serde_json::from_str(&content)?;
        let mut index = Self::default();
        for value in raw {
            let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map_err(|_| ArchiveError::InvalidDate(value.clone()))?;
            if !index.contains(date) {
                index.dates.push(date);
            }
        }

        Ok(index)
    }

    /// Write the index as a compact JSON array
    pub fn save(&self, path: &Path) -> Result<(), ArchiveError> {
        let raw: Vec<String> = self
            .dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        let bytes = serde_json::to_vec(&raw)?;
        write_atomic(path, &bytes).map_err(|e| ArchiveError::io("write", path, e))
    }

    /// Dates, most recent first
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Put `date` at the front; false if it was already present
    pub fn prepend(&mut self, date: NaiveDate) -> bool {
        if self.contains(date) {
            return false;
        }
        self.dates.insert(0, date);
        true
    }
}

/// Result of a rotation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// No published document exists yet
    NothingPublished,
    /// The published document already belongs to today
    Current,
    /// The published document's date is already in the archive index; a run
    /// for today was interrupted before publishing
    AlreadyArchived { date: NaiveDate },
    /// The published document was archived
    Rotated {
        date: NaiveDate,
        /// Assets now present in the dated directory
        archived: usize,
        /// Referenced assets found neither flat nor archived
        missing: usize,
        /// Whether this call wrote the snapshot
        snapshot_written: bool,
    },
}

/// Moves the previous day's published set into dated storage
pub struct ArchiveRotation {
    output: OutputConfig,
    publication: PublicationWriter,
}

impl ArchiveRotation {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            output: output.clone(),
            publication: PublicationWriter::new(output),
        }
    }

    /// Rotate the published set if it is older than `today`
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` on any filesystem or format failure. Callers in
    /// a generation run log it and continue.
    pub fn rotate(&self, today: NaiveDate) -> Result<RotationOutcome, ArchiveError> {
        let Some(mut set) = self.publication.load_current()? else {
            tracing::debug!("No published set, nothing to rotate");
            return Ok(RotationOutcome::NothingPublished);
        };

        if set.date == today {
            tracing::debug!(date = %today, "Published set is current");
            return Ok(RotationOutcome::Current);
        }

        let old_date = set.date;
        let date_key = old_date.format("%Y-%m-%d").to_string();

        let index_path = self.output.archive_index_path();
        let mut index = ArchiveIndex::load(&index_path)?;
        if index.contains(old_date) {
            tracing::info!(
                date = %date_key,
                "Published set already archived, leaving current assets in place"
            );
            return Ok(RotationOutcome::AlreadyArchived { date: old_date });
        }

        tracing::info!(date = %date_key, "Rotating published set into archive");

        let archive_dir = self.output.images_path().join(&date_key);
        fs::create_dir_all(&archive_dir)
            .map_err(|e| ArchiveError::io("create", &archive_dir, e))?;

        let mut archived_sources: Vec<PathBuf> = Vec::new();
        let mut archived = 0;
        let mut missing = 0;

        for reference in set.asset_refs_mut() {
            let Some(file_name) = self.flat_asset_name(reference) else {
                tracing::debug!(asset = %reference, "Reference is not a current asset, leaving as is");
                continue;
            };

            let source = self.output.web_root.join(reference.as_str());
            let target = archive_dir.join(&file_name);

            match (source.is_file(), target.is_file()) {
                (true, false) => {
                    fs::copy(&source, &target)
                        .map_err(|e| ArchiveError::io("copy", &source, e))?;
                    archived_sources.push(source);
                }
                (true, true) => {
                    if same_content(&source, &target)? {
                        archived_sources.push(source);
                    } else {
                        tracing::warn!(
                            asset = %reference,
                            "Flat asset differs from archived copy, keeping both"
                        );
                    }
                }
                (false, true) => {}
                (false, false) => {
                    tracing::warn!(asset = %reference, "Referenced asset is missing, not archived");
                    missing += 1;
                    continue;
                }
            }

            *reference = format!("{}/{date_key}/{file_name}", self.output.images_dir);
            archived += 1;
        }

        let snapshot = self.output.snapshot_path(&date_key);
        let snapshot_written = if snapshot.exists() {
            tracing::info!(path = %snapshot.display(), "Snapshot exists, not overwriting");
            false
        } else {
            let bytes = to_document(&set)?;
            write_atomic(&snapshot, &bytes).map_err(|e| ArchiveError::io("write", &snapshot, e))?;
            true
        };

        for source in &archived_sources {
            fs::remove_file(source).map_err(|e| ArchiveError::io("remove", source, e))?;
        }

        index.prepend(old_date);
        index.save(&index_path)?;

        tracing::info!(
            date = %date_key,
            archived = archived,
            missing = missing,
            "Rotation complete"
        );

        Ok(RotationOutcome::Rotated {
            date: old_date,
            archived,
            missing,
            snapshot_written,
        })
    }

    /// File name of a reference that points directly into the image directory
    fn flat_asset_name(&self, reference: &str) -> Option<String> {
        let rest = reference.strip_prefix(&self.output.images_dir)?.strip_prefix('/')?;
        (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
    }
}

fn same_content(a: &Path, b: &Path) -> Result<bool, ArchiveError> {
    let left = fs::read(a).map_err(|e| ArchiveError::io("read", a, e))?;
    let right = fs::read(b).map_err(|e| ArchiveError::io("read", b, e))?;
    Ok(left == right)
}
