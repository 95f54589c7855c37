//! Uniform adapters over each hub's command-line client.
//!
//! Each remote hub is wrapped as one variant of [`ModelSource`]: the hub's
//! official CLI is run as a child process and either succeeds or fails. A
//! missing binary surfaces as [`FetchError::CapabilityUnavailable`] with the
//! install command; everything else collapses to a transfer failure.
//!
//! The one piece of process-wide state touched here is the `HF_ENDPOINT`
//! environment value. It is mutated only inside the dynamic extent of a
//! single fetch via [`EndpointGuard`], which restores the prior state on
//! every exit path.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::config::HubConfig;
use crate::error::{FetchError, Result};

/// Identity of a remote hub, as selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// ModelScope via the `modelscope` CLI.
    ModelScope,
    /// Hugging Face through the community mirror endpoint.
    HfMirror,
    /// Hugging Face official endpoint.
    HfOfficial,
    /// Meta-source: try concrete sources in a fixed order.
    Auto,
}

impl SourceKind {
    /// Fixed fallback order for [`SourceKind::Auto`]: reachability-friendly
    /// sources first.
    pub const AUTO_ORDER: [SourceKind; 3] = [
        SourceKind::ModelScope,
        SourceKind::HfMirror,
        SourceKind::HfOfficial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ModelScope => "ModelScope",
            SourceKind::HfMirror => "Hugging Face mirror",
            SourceKind::HfOfficial => "Hugging Face official",
            SourceKind::Auto => "Auto",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One hub's fetch capability: download a full snapshot of `identifier` into
/// `dest`. Partial contents after a failure are expected; the integrity
/// checker deals with them afterwards.
pub trait ModelSource {
    /// Human-readable source name for reports.
    fn label(&self) -> &'static str;

    /// Fetch the model snapshot into `dest`, creating the directory if
    /// needed.
    fn fetch(&self, identifier: &str, dest: &Path) -> Result<()>;
}

/// Scoped set-and-restore for an environment variable.
///
/// On drop the variable is returned to exactly its prior state, including
/// removal when it was previously unset. Drop runs on success, failure and
/// unwind alike.
pub struct EndpointGuard {
    var: &'static str,
    prior: Option<OsString>,
    active: bool,
}

impl EndpointGuard {
    /// Set `var` to `value` for the lifetime of the guard.
    pub fn set(var: &'static str, value: &str) -> Self {
        let prior = env::var_os(var);
        env::set_var(var, value);
        debug!(var, value, "Endpoint override set");
        Self {
            var,
            prior,
            active: true,
        }
    }

    /// Remove `var` for the lifetime of the guard.
    pub fn clear(var: &'static str) -> Self {
        let prior = env::var_os(var);
        env::remove_var(var);
        debug!(var, "Endpoint override cleared");
        Self {
            var,
            prior,
            active: true,
        }
    }

    /// A guard that neither touches nor restores anything.
    pub fn untouched(var: &'static str) -> Self {
        Self {
            var,
            prior: None,
            active: false,
        }
    }
}

impl Drop for EndpointGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        match self.prior.take() {
            Some(value) => env::set_var(self.var, value),
            None => env::remove_var(self.var),
        }
        debug!(var = self.var, "Endpoint override restored");
    }
}

/// Run a hub client to completion, inheriting stdio so the user sees the
/// client's own progress output.
///
/// Distinguishes "binary not on PATH" from every other failure; callers map
/// the former to a capability error with an install hint.
fn run_client(program: &str, args: &[&str], hub: &str) -> Result<()> {
    debug!(program, ?args, "Invoking hub client");
    let status = Command::new(program).args(args).status().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            FetchError::CapabilityUnavailable {
                tool: program.to_string(),
                install_hint: String::new(), // filled in by the caller
            }
        } else {
            FetchError::Transfer {
                hub: hub.to_string(),
                message: format!("Failed to launch {}: {}", program, e),
            }
        }
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(FetchError::Transfer {
            hub: hub.to_string(),
            message: format!("{} exited with {}", program, status),
        })
    }
}

/// ModelScope hub, wrapping the `modelscope` CLI.
#[derive(Debug, Default)]
pub struct ModelScopeSource;

impl ModelSource for ModelScopeSource {
    fn label(&self) -> &'static str {
        SourceKind::ModelScope.as_str()
    }

    fn fetch(&self, identifier: &str, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest).map_err(|e| FetchError::io_with_path(e, dest))?;
        let dest_str = dest.to_string_lossy();

        info!(model = identifier, dest = %dest.display(), "Downloading from ModelScope");
        run_client(
            HubConfig::MODELSCOPE_BIN,
            &[
                "download",
                "--model",
                identifier,
                "--local_dir",
                dest_str.as_ref(),
            ],
            self.label(),
        )
        .map_err(|e| match e {
            FetchError::CapabilityUnavailable { tool, .. } => {
                FetchError::CapabilityUnavailable {
                    tool,
                    install_hint: HubConfig::MODELSCOPE_INSTALL_HINT.to_string(),
                }
            }
            other => other,
        })
    }
}

/// Hugging Face hub, wrapping the `hf` CLI (with a fallback to the legacy
/// `huggingface-cli` binary name).
///
/// The mirror variant points `HF_ENDPOINT` at the community mirror for the
/// duration of the fetch. The official variant never clobbers an endpoint
/// the user had configured when the session began; that startup value is the
/// authoritative restoration baseline.
#[derive(Debug)]
pub struct HuggingFaceSource {
    mirror: bool,
    startup_endpoint: Option<String>,
}

impl HuggingFaceSource {
    /// Official-endpoint variant, capturing the current `HF_ENDPOINT` as the
    /// session baseline.
    pub fn official() -> Self {
        Self::with_startup_endpoint(false, env::var(HubConfig::HF_ENDPOINT_VAR).ok())
    }

    /// Mirror variant, capturing the current `HF_ENDPOINT` as the session
    /// baseline.
    pub fn mirror() -> Self {
        Self::with_startup_endpoint(true, env::var(HubConfig::HF_ENDPOINT_VAR).ok())
    }

    /// Construct with an explicit session baseline. The baseline decides
    /// whether an official fetch may clear the endpoint variable: a value the
    /// user had set at session start is left alone.
    pub fn with_startup_endpoint(mirror: bool, startup_endpoint: Option<String>) -> Self {
        Self {
            mirror,
            startup_endpoint,
        }
    }

    fn endpoint_guard(&self) -> EndpointGuard {
        if self.mirror {
            EndpointGuard::set(HubConfig::HF_ENDPOINT_VAR, HubConfig::HF_MIRROR_ENDPOINT)
        } else if self.startup_endpoint.is_some() {
            // User-configured endpoint pre-existed; respect it.
            EndpointGuard::untouched(HubConfig::HF_ENDPOINT_VAR)
        } else {
            // Nothing was configured at session start; make sure a leftover
            // value cannot redirect the official fetch.
            EndpointGuard::clear(HubConfig::HF_ENDPOINT_VAR)
        }
    }
}

impl ModelSource for HuggingFaceSource {
    fn label(&self) -> &'static str {
        if self.mirror {
            SourceKind::HfMirror.as_str()
        } else {
            SourceKind::HfOfficial.as_str()
        }
    }

    fn fetch(&self, identifier: &str, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest).map_err(|e| FetchError::io_with_path(e, dest))?;
        let dest_str = dest.to_string_lossy();
        let args = ["download", identifier, "--local-dir", dest_str.as_ref()];

        let _guard = self.endpoint_guard();
        info!(
            model = identifier,
            dest = %dest.display(),
            mirror = self.mirror,
            "Downloading from Hugging Face"
        );

        match run_client(HubConfig::HF_BIN, &args, self.label()) {
            Err(FetchError::CapabilityUnavailable { .. }) => {
                // Older installs only ship the long binary name.
                debug!(
                    "{} not found, trying {}",
                    HubConfig::HF_BIN,
                    HubConfig::HF_LEGACY_BIN
                );
                run_client(HubConfig::HF_LEGACY_BIN, &args, self.label()).map_err(|e| match e {
                    FetchError::CapabilityUnavailable { .. } => {
                        FetchError::CapabilityUnavailable {
                            tool: HubConfig::HF_LEGACY_BIN.to_string(),
                            install_hint: HubConfig::HF_INSTALL_HINT.to_string(),
                        }
                    }
                    other => other,
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment mutation is process-wide; serialize every test that
    // touches it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VAR: &str = "MODELFETCH_TEST_ENDPOINT";

    #[test]
    fn test_guard_set_restores_absent() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var(VAR);

        {
            let _guard = EndpointGuard::set(VAR, "https://mirror.example");
            assert_eq!(env::var(VAR).unwrap(), "https://mirror.example");
        }
        assert!(env::var_os(VAR).is_none());
    }

    #[test]
    fn test_guard_set_restores_prior_value() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var(VAR, "https://user.example");

        {
            let _guard = EndpointGuard::set(VAR, "https://mirror.example");
            assert_eq!(env::var(VAR).unwrap(), "https://mirror.example");
        }
        assert_eq!(env::var(VAR).unwrap(), "https://user.example");
        env::remove_var(VAR);
    }

    #[test]
    fn test_guard_restores_on_unwind() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var(VAR);

        let result = std::panic::catch_unwind(|| {
            let _guard = EndpointGuard::set(VAR, "https://mirror.example");
            panic!("fetch blew up");
        });
        assert!(result.is_err());
        assert!(env::var_os(VAR).is_none());
    }

    #[test]
    fn test_guard_clear_restores_prior_value() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var(VAR, "https://leftover.example");

        {
            let _guard = EndpointGuard::clear(VAR);
            assert!(env::var_os(VAR).is_none());
        }
        assert_eq!(env::var(VAR).unwrap(), "https://leftover.example");
        env::remove_var(VAR);
    }

    #[test]
    fn test_guard_untouched_changes_nothing() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var(VAR, "https://user.example");

        {
            let _guard = EndpointGuard::untouched(VAR);
            assert_eq!(env::var(VAR).unwrap(), "https://user.example");
        }
        assert_eq!(env::var(VAR).unwrap(), "https://user.example");
        env::remove_var(VAR);
    }

    #[test]
    fn test_official_respects_user_endpoint() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var(HubConfig::HF_ENDPOINT_VAR, "https://user.example");

        let source =
            HuggingFaceSource::with_startup_endpoint(false, Some("https://user.example".into()));
        {
            let _guard = source.endpoint_guard();
            // Official fetch with a user baseline leaves the value alone.
            assert_eq!(
                env::var(HubConfig::HF_ENDPOINT_VAR).unwrap(),
                "https://user.example"
            );
        }
        assert_eq!(
            env::var(HubConfig::HF_ENDPOINT_VAR).unwrap(),
            "https://user.example"
        );
        env::remove_var(HubConfig::HF_ENDPOINT_VAR);
    }

    #[test]
    fn test_official_clears_leftover_when_no_baseline() {
        let _lock = ENV_LOCK.lock().unwrap();
        // A mirror value is lingering but the user had nothing configured at
        // session start.
        env::set_var(HubConfig::HF_ENDPOINT_VAR, "https://hf-mirror.com");

        let source = HuggingFaceSource::with_startup_endpoint(false, None);
        {
            let _guard = source.endpoint_guard();
            assert!(env::var_os(HubConfig::HF_ENDPOINT_VAR).is_none());
        }
        assert_eq!(
            env::var(HubConfig::HF_ENDPOINT_VAR).unwrap(),
            "https://hf-mirror.com"
        );
        env::remove_var(HubConfig::HF_ENDPOINT_VAR);
    }

    #[test]
    fn test_mirror_sets_and_removes_endpoint() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var(HubConfig::HF_ENDPOINT_VAR);

        let source = HuggingFaceSource::with_startup_endpoint(true, None);
        {
            let _guard = source.endpoint_guard();
            assert_eq!(
                env::var(HubConfig::HF_ENDPOINT_VAR).unwrap(),
                HubConfig::HF_MIRROR_ENDPOINT
            );
        }
        assert!(env::var_os(HubConfig::HF_ENDPOINT_VAR).is_none());
    }

    #[test]
    fn test_auto_order_is_fixed() {
        assert_eq!(
            SourceKind::AUTO_ORDER,
            [
                SourceKind::ModelScope,
                SourceKind::HfMirror,
                SourceKind::HfOfficial
            ]
        );
    }
}
