//! Centralized configuration constants for modelfetch.

/// Hub endpoints, client binaries, and environment knobs.
pub struct HubConfig;

impl HubConfig {
    /// Environment variable the Hugging Face tooling reads for an alternate
    /// endpoint. Mutated only inside [`crate::EndpointGuard`] scopes.
    pub const HF_ENDPOINT_VAR: &'static str = "HF_ENDPOINT";
    /// Community mirror serving Hugging Face content.
    pub const HF_MIRROR_ENDPOINT: &'static str = "https://hf-mirror.com";

    pub const MODELSCOPE_BIN: &'static str = "modelscope";
    pub const MODELSCOPE_INSTALL_HINT: &'static str = "pip install modelscope";

    /// Current CLI name for the huggingface_hub package, plus the legacy name
    /// still shipped by older installs.
    pub const HF_BIN: &'static str = "hf";
    pub const HF_LEGACY_BIN: &'static str = "huggingface-cli";
    pub const HF_INSTALL_HINT: &'static str = "pip install -U huggingface_hub";
}

/// Storage layout and completeness heuristics.
pub struct StoreConfig;

impl StoreConfig {
    /// Directory name suggested when the user accepts the default root.
    pub const DEFAULT_ROOT_NAME: &'static str = "models";

    /// Configuration descriptor every complete snapshot must carry.
    pub const CONFIG_DESCRIPTOR: &'static str = "config.json";

    /// Recognized weight-file extensions. A snapshot needs at least one file
    /// with one of these extensions to count as complete.
    pub const WEIGHT_EXTENSIONS: &'static [&'static str] = &["safetensors", "bin", "gguf", "pt"];

    /// Character substituted for the hub namespace separator in local names.
    pub const NAME_SEPARATOR_REPLACEMENT: char = '_';
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_extensions_cover_common_formats() {
        assert!(StoreConfig::WEIGHT_EXTENSIONS.contains(&"safetensors"));
        assert!(StoreConfig::WEIGHT_EXTENSIONS.contains(&"bin"));
    }

    #[test]
    fn test_mirror_endpoint_is_https() {
        assert!(HubConfig::HF_MIRROR_ENDPOINT.starts_with("https://"));
    }
}
