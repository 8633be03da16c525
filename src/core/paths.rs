//! Centralized path helpers for the settings file and the models cache.

use std::env;
use std::path::PathBuf;

use crate::core::app;

/// Project directories (config, cache) from the standard platform locations.
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("ai", app::VENDOR, app::NAME)
}

fn dir_override(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Config directory (~/.config/asksage-client/). `ASKSAGE_CONFIG_DIR` overrides it.
pub fn config_dir() -> Option<PathBuf> {
    dir_override("ASKSAGE_CONFIG_DIR")
        .or_else(|| project_dirs().map(|d| d.config_dir().to_path_buf()))
}

/// Cache directory (~/.cache/asksage-client/). `ASKSAGE_CACHE_DIR` overrides it.
pub fn cache_dir() -> Option<PathBuf> {
    dir_override("ASKSAGE_CACHE_DIR")
        .or_else(|| project_dirs().map(|d| d.cache_dir().to_path_buf()))
}

/// Settings file holding the access token and account.
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("settings.json"))
}

/// Persisted model list and its fetch timestamp.
pub fn models_cache_path() -> Option<PathBuf> {
    cache_dir().map(|d| d.join("models.json"))
}
