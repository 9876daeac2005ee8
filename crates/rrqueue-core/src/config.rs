//! Config file loading and saving.

use rrqueue_types::{AppConfig, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "RRQUEUE_CONFIG";
const CONFIG_FILE: &str = "config.json";

/// `$RRQUEUE_CONFIG`, or `<config dir>/rrqueue/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("rrqueue").join(CONFIG_FILE))
}

/// Load and validate the config at `path`.
///
/// A missing file yields the default config (a single `memory` connection).
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let config: AppConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?;
    config.validate()?;

    tracing::debug!(
        path = %path.display(),
        connections = config.queue.connections.len(),
        store = config.store.kind(),
        "Config loaded"
    );
    Ok(config)
}

/// Save `config` to `path` via a temp file and rename.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::from_io_error(&e))?;
    }
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to serialize config: {}", e),
    })?;

    fs::write(&temp_path, content).map_err(|e| ConfigError::from_io_error(&e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::from_io_error(&e))
}
