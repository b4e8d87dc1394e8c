//! STARWATCH-X core
//!
//! Configuration loading and the concrete framework backend used by the
//! `starwatch` binary.

pub mod config;
pub mod ultralytics;

pub use config::{ConfigError, ConfigResult, StarwatchConfig};
pub use ultralytics::{PythonRuntime, UltralyticsBackend, UltralyticsExporter, UltralyticsTrainer};
