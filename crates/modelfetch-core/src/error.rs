//! Error types for modelfetch.
//!
//! One enum covers the whole taxonomy: configuration errors are fatal to a
//! session, capability/transfer errors are recoverable by trying another hub,
//! and cleanup errors are reported but non-fatal. User cancellation is not an
//! error at all; the session layer models it as a distinct outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for modelfetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    // Configuration errors (storage root unusable, etc.)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The hub's client binary is not installed or not on PATH.
    #[error("'{tool}' is not available; install it with `{install_hint}`")]
    CapabilityUnavailable {
        tool: String,
        install_hint: String,
    },

    /// Any failure during an actual transfer attempt. Network errors,
    /// remote-not-found and disk-full all collapse to this at the
    /// orchestration level.
    #[error("Download from {hub} failed: {message}")]
    Transfer { hub: String, message: String },

    /// Failed to delete a stale or partial model directory.
    #[error("Failed to remove {path}: {message}")]
    Cleanup { path: PathBuf, message: String },

    #[error("Invalid model identifier: {0:?}")]
    InvalidIdentifier(String),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },
}

/// Result type alias for modelfetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl FetchError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        FetchError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether another hub may still succeed after this error.
    ///
    /// Capability and transfer failures are per-source; everything else ends
    /// the download phase.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FetchError::CapabilityUnavailable { .. } | FetchError::Transfer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::CapabilityUnavailable {
            tool: "modelscope".into(),
            install_hint: "pip install modelscope".into(),
        };
        assert_eq!(
            err.to_string(),
            "'modelscope' is not available; install it with `pip install modelscope`"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(FetchError::Transfer {
            hub: "ModelScope".into(),
            message: "exit status 1".into(),
        }
        .is_recoverable());
        assert!(!FetchError::Config {
            message: "bad root".into()
        }
        .is_recoverable());
        assert!(!FetchError::InvalidIdentifier(String::new()).is_recoverable());
    }
}
