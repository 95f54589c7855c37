//! Modelfetch Core - Local model state machine and download orchestration.
//!
//! This crate decides, given a storage root and a model identifier, whether a
//! download is needed, which remote hub to fetch from, how to fall back across
//! hubs, and how to validate the result. The actual transfer is delegated to
//! each hub's own command-line client, treated as an opaque capability that
//! either succeeds or fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use modelfetch_core::{ModelReference, ModelStore, Orchestrator, SourceKind};
//!
//! fn main() -> modelfetch_core::Result<()> {
//!     let store = ModelStore::open("./models")?;
//!     let reference = ModelReference::parse("Qwen/Qwen2-7B-Instruct")?;
//!
//!     let orchestrator = Orchestrator::with_default_sources();
//!     if !orchestrator.download_single(&reference, &store, SourceKind::ModelScope) {
//!         eprintln!("download failed");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod integrity;
pub mod reference;
pub mod source;
pub mod store;

pub use download::Orchestrator;
pub use error::{FetchError, Result};
pub use integrity::{check_model_dir, dir_size, IntegrityStatus};
pub use reference::ModelReference;
pub use source::{
    EndpointGuard, HuggingFaceSource, ModelScopeSource, ModelSource, SourceKind,
};
pub use store::{resolve_existing, ExistingChoice, ModelStore};
