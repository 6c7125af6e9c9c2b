//! Configuration for benchmark runs
//!
//! A [`RunConfig`] names the model endpoint and the ordered list of suites to
//! run. It is loaded from a JSON, TOML or YAML file, then adjusted by
//! `GAUGE_*` environment variables and command-line flags.

mod env_loader;
mod file_loader;
mod logging_config;
mod model;
mod run;
mod suite;

pub use env_loader::{
    ENV_API_KEY, ENV_API_URL, ENV_LOG_LEVEL, ENV_MODEL, ENV_OUTPUT_DIR, apply_env_overrides,
    apply_overrides_with, load_dotenv,
};
pub use file_loader::load_from_file;
pub use logging_config::{LogFormat, LoggingConfig};
pub use model::{ApiStyle, ModelEndpoint, RetryPolicy};
pub use run::RunConfig;
pub use suite::{DatasetSource, HarnessConfig, SuiteConfig};
