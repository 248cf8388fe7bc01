//! Typed access to per-module configuration sections.
//!
//! The app config carries one raw JSON section per module
//! (`modules.<name> = { config: {...} }`). Modules read their section either
//! leniently ([`module_config_or_default`], missing section falls back to
//! `T::default()`) or strictly ([`module_config_required`]).

use serde::de::DeserializeOwned;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("module '{module}' not found")]
    ModuleNotFound { module: String },

    #[error("module '{module}' config must be an object")]
    InvalidModuleStructure { module: String },

    #[error("missing 'config' section in module '{module}'")]
    MissingConfigSection { module: String },

    #[error("invalid config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns the raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

fn parse_section<T: DeserializeOwned>(
    module_name: &str,
    section: &serde_json::Value,
) -> Result<T, ConfigError> {
    serde_json::from_value(section.clone()).map_err(|e| ConfigError::InvalidConfig {
        module: module_name.to_owned(),
        source: e,
    })
}

/// Lenient loader: any missing piece falls back to `T::default()`; a config
/// section that exists but does not deserialize is still an error.
///
/// # Errors
/// Returns [`ConfigError::InvalidConfig`] if the section exists but cannot
/// be deserialized.
pub fn module_config_or_default<T: DeserializeOwned + Default>(
    provider: &dyn ConfigProvider,
    module_name: &str,
) -> Result<T, ConfigError> {
    let section = provider
        .get_module_config(module_name)
        .and_then(|raw| raw.as_object())
        .and_then(|obj| obj.get("config"));

    match section {
        Some(section) => parse_section(module_name, section),
        None => Ok(T::default()),
    }
}

/// Strict loader: the module section and its `config` field must both exist
/// and deserialize.
///
/// # Errors
/// Returns a [`ConfigError`] naming the first missing or invalid piece.
pub fn module_config_required<T: DeserializeOwned>(
    provider: &dyn ConfigProvider,
    module_name: &str,
) -> Result<T, ConfigError> {
    let raw = provider
        .get_module_config(module_name)
        .ok_or_else(|| ConfigError::ModuleNotFound {
            module: module_name.to_owned(),
        })?;

    let obj = raw
        .as_object()
        .ok_or_else(|| ConfigError::InvalidModuleStructure {
            module: module_name.to_owned(),
        })?;

    let section = obj
        .get("config")
        .ok_or_else(|| ConfigError::MissingConfigSection {
            module: module_name.to_owned(),
        })?;

    parse_section(module_name, section)
}
