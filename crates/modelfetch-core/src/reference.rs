//! Model references and filesystem-safe local names.
//!
//! Hub identifiers use `owner/name` namespacing; the local directory name
//! replaces every separator so the result is a single valid path segment on
//! all supported platforms.

use crate::config::StoreConfig;
use crate::error::{FetchError, Result};

/// Immutable reference to one model: the hub-facing identifier plus the
/// derived local directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    identifier: String,
    local_name: String,
}

impl ModelReference {
    /// Build a reference from a raw identifier string.
    ///
    /// Derivation is deterministic and total for any non-empty identifier;
    /// empty (or whitespace-only) input is rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelfetch_core::ModelReference;
    ///
    /// let r = ModelReference::parse("Qwen/Qwen2-7B-Instruct").unwrap();
    /// assert_eq!(r.local_name(), "Qwen_Qwen2-7B-Instruct");
    /// ```
    pub fn parse(identifier: &str) -> Result<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(FetchError::InvalidIdentifier(identifier.to_string()));
        }
        Ok(Self {
            identifier: identifier.to_string(),
            local_name: local_name_for(identifier),
        })
    }

    /// The hub-facing identifier, exactly as entered (trimmed).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The filesystem-safe directory name for this model.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl std::fmt::Display for ModelReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier)
    }
}

/// Derive the local directory name for an identifier by replacing every
/// namespace separator.
fn local_name_for(identifier: &str) -> String {
    identifier.replace('/', &StoreConfig::NAME_SEPARATOR_REPLACEMENT.to_string())
}
