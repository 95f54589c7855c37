//! Structural completeness checks for a local model directory.
//!
//! Completeness is a heuristic over the directory layout, not a cryptographic
//! guarantee: a snapshot counts as complete when the configuration descriptor
//! is present alongside at least one recognized weight file.

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::Result;

/// Derived state of a local model directory. Recomputed on demand, never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// The directory does not exist.
    Absent,
    /// The directory exists but lacks the descriptor or any weight file.
    Incomplete,
    /// Descriptor plus at least one weight file are present.
    Complete,
}

/// Inspect `dir` and classify it.
///
/// Filesystem errors during the walk propagate; a directory we cannot read is
/// a fatal condition for the session rather than something to paper over.
pub fn check_model_dir(dir: &Path) -> Result<IntegrityStatus> {
    if !dir.exists() {
        return Ok(IntegrityStatus::Absent);
    }

    let descriptor = dir.join(StoreConfig::CONFIG_DESCRIPTOR);
    if !descriptor.exists() {
        debug!(
            dir = %dir.display(),
            "Integrity check failed: missing {}",
            StoreConfig::CONFIG_DESCRIPTOR
        );
        return Ok(IntegrityStatus::Incomplete);
    }

    if !has_weight_file(dir)? {
        debug!(
            dir = %dir.display(),
            "Integrity check failed: no weight file ({})",
            StoreConfig::WEIGHT_EXTENSIONS.join("/")
        );
        return Ok(IntegrityStatus::Incomplete);
    }

    // Informational only; the byte total is not part of the status.
    let total = dir_size(dir)?;
    info!(
        dir = %dir.display(),
        bytes = total,
        "Integrity check passed: descriptor and weight file present"
    );
    Ok(IntegrityStatus::Complete)
}

/// Whether any file under `dir` (recursively) has a recognized weight
/// extension.
fn has_weight_file(dir: &Path) -> Result<bool> {
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(walkdir_to_io)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_weight = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                StoreConfig::WEIGHT_EXTENSIONS
                    .iter()
                    .any(|w| ext.eq_ignore_ascii_case(w))
            });
        if is_weight {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Total byte size of all files recursively under `dir`.
pub fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(walkdir_to_io)?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(walkdir_to_io)?.len();
        }
    }
    Ok(total)
}

fn walkdir_to_io(err: walkdir::Error) -> crate::FetchError {
    let path = err.path().map(|p| p.to_path_buf());
    crate::FetchError::Io {
        message: err.to_string(),
        path,
        source: err.into_io_error(),
    }
}
