//! Persistence under the web root
//!
//! Everything the generator writes lives below one directory:
//!
//! ```text
//! <web_root>/
//!   quiz-data.json               current published set
//!   quiz-data-<date>.json        archived snapshots
//!   archive-index.json           archived dates, most recent first
//!   images/<key>.png             current assets
//!   images/<date>/<key>.png      archived assets
//! ```
//!
//! All files are written with [`write_atomic`], so a reader or a killed run
//! never observes a partially written file.

pub mod archive;
pub mod assets;
pub mod publish;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub use archive::{ArchiveIndex, ArchiveRotation, RotationOutcome};
pub use assets::{Asset, AssetCache, AssetStatus};
pub use publish::PublicationWriter;

/// Temporary sibling used while writing `path`
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `bytes` to `path` via a temporary file and rename
///
/// The temporary file lives in the same directory so the rename stays on one
/// filesystem.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = temp_path(path);

    let result = (|| {
        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }

    result
}
