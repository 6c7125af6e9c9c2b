//! Gauge core: configuration, errors, logging and model inference
//!
//! The benchmark engine itself lives in `gauge-eval`; this crate holds the
//! pieces it shares with the command line front end.

pub mod config;
pub mod error;
pub mod llm;
pub mod logging;

pub use config::{
    ApiStyle, DatasetSource, HarnessConfig, LogFormat, LoggingConfig, ModelEndpoint, RetryPolicy,
    RunConfig, SuiteConfig,
};
pub use error::{GaugeError, GaugeResult};
pub use llm::{
    Generation, GenerationError, GenerationOutcome, HttpInferenceClient, InferenceBackend,
};
pub use logging::init_logging;
