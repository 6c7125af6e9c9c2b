//! File-based configuration loading

use super::run::RunConfig;
use crate::error::{GaugeError, GaugeResult};
use std::fs;
use std::path::Path;

/// Load a run configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension. Relative
/// dataset paths are resolved against the file's directory.
pub fn load_from_file(path: &Path) -> GaugeResult<RunConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        GaugeError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let mut config = parse_config(&content, path)?;

    if let Some(base_dir) = path.parent() {
        config.resolve_paths(base_dir);
    }

    Ok(config)
}

fn parse_config(content: &str, path: &Path) -> GaugeResult<RunConfig> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(content).map_err(|e| {
            GaugeError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(content).map_err(|e| {
            GaugeError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(content).map_err(|e| {
            GaugeError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}
