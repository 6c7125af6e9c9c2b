//! Environment variable overrides
//!
//! Variables use the `GAUGE_` prefix. A `.env` file in the working directory
//! is honored when present.

use super::run::RunConfig;
use std::path::PathBuf;

pub const ENV_MODEL: &str = "GAUGE_MODEL";
pub const ENV_API_URL: &str = "GAUGE_API_URL";
pub const ENV_API_KEY: &str = "GAUGE_API_KEY";
pub const ENV_OUTPUT_DIR: &str = "GAUGE_OUTPUT_DIR";
pub const ENV_LOG_LEVEL: &str = "GAUGE_LOG_LEVEL";

/// Load a `.env` file into the process environment if one exists
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
    }
}

/// Apply `GAUGE_*` overrides from the process environment
pub fn apply_env_overrides(config: &mut RunConfig) {
    apply_overrides_with(config, |key| std::env::var(key).ok());
}

/// Apply overrides using an arbitrary lookup
pub fn apply_overrides_with<F>(config: &mut RunConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(model) = lookup(ENV_MODEL) {
        config.model.name = model;
    }
    if let Some(url) = lookup(ENV_API_URL) {
        config.model.base_url = url;
    }
    if let Some(key) = lookup(ENV_API_KEY) {
        config.model.api_key = Some(key);
    }
    if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
}
