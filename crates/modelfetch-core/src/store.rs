//! Storage root management and the existing-model state machine.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{FetchError, Result};
use crate::integrity::IntegrityStatus;
use crate::reference::ModelReference;

/// Directory under which each model occupies its own subdirectory named by
/// the reference's local name. Created at open time; read-only for the rest
/// of the session.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Open (creating if necessary) the storage root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| FetchError::Config {
            message: format!("Cannot create storage root {}: {}", root.display(), e),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination directory for one model.
    pub fn model_dir(&self, reference: &ModelReference) -> PathBuf {
        self.root.join(reference.local_name())
    }

    /// Recursively delete a model's subdirectory.
    pub fn remove_model(&self, reference: &ModelReference) -> Result<()> {
        let dir = self.model_dir(reference);
        fs::remove_dir_all(&dir).map_err(|e| FetchError::Cleanup {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        info!(dir = %dir.display(), "Removed model directory");
        Ok(())
    }

    /// Best-effort cleanup of a partial download. Reported, never fatal.
    pub fn remove_model_best_effort(&self, reference: &ModelReference) {
        if let Err(e) = self.remove_model(reference) {
            warn!("Cleanup of partial download failed: {}", e);
        }
    }
}

/// User decision about an already-present model directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingChoice {
    /// Keep the complete copy; skip the download.
    UseExisting,
    /// Remove whatever is there and download again.
    DeleteAndRedownload,
    /// Leave an incomplete copy in place and end the session.
    Cancel,
}

/// Decide whether a download is needed for `reference`, applying the user's
/// choice about any existing directory.
///
/// Returns `true` when a download should proceed; in that case the model
/// subdirectory is guaranteed not to exist (prior contents were removed, or
/// there never were any). Deletion failure propagates as an error, which the
/// caller must treat as "cannot continue" rather than "download anyway".
pub fn resolve_existing(
    store: &ModelStore,
    reference: &ModelReference,
    status: IntegrityStatus,
    choice: ExistingChoice,
) -> Result<bool> {
    match (status, choice) {
        (IntegrityStatus::Absent, _) => Ok(true),

        (IntegrityStatus::Complete, ExistingChoice::UseExisting) => {
            info!(model = %reference, "Using existing complete model");
            Ok(false)
        }
        (IntegrityStatus::Complete, ExistingChoice::DeleteAndRedownload)
        | (IntegrityStatus::Incomplete, ExistingChoice::DeleteAndRedownload) => {
            store.remove_model(reference)?;
            Ok(true)
        }

        (IntegrityStatus::Incomplete, ExistingChoice::Cancel) => {
            info!(model = %reference, "Download cancelled; incomplete copy left as-is");
            Ok(false)
        }

        // A complete model cannot be "cancelled" and an incomplete one cannot
        // be "used"; the prompt layer never produces these pairs.
        (IntegrityStatus::Complete, ExistingChoice::Cancel)
        | (IntegrityStatus::Incomplete, ExistingChoice::UseExisting) => Ok(false),
    }
}
