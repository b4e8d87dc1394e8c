//! Ultralytics backend.
//!
//! The pipeline types live in `starwatch-training`. This module implements
//! its `Trainer` and `Exporter` capabilities by driving the Ultralytics
//! Python package in a child process.

pub mod exporter;
pub mod runtime;
pub mod scripts;
pub mod trainer;

pub use exporter::UltralyticsExporter;
pub use runtime::{FrameworkInfo, PythonRuntime};
pub use trainer::UltralyticsTrainer;

use starwatch_training::PipelineResult;

/// A probed Python runtime known to import Ultralytics.
#[derive(Debug, Clone)]
pub struct UltralyticsBackend {
    runtime: PythonRuntime,
    info: FrameworkInfo,
}

impl UltralyticsBackend {
    /// Probe the interpreter. Call only after the stage inputs validated.
    pub async fn acquire(runtime: PythonRuntime) -> PipelineResult<Self> {
        let info = runtime.probe().await?;
        tracing::info!(python = %runtime.python().display(), version = %info.version, "ultralytics available");
        Ok(Self { runtime, info })
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.info.version
    }

    #[must_use]
    pub fn trainer(&self) -> UltralyticsTrainer {
        UltralyticsTrainer::new(self.runtime.clone())
    }

    #[must_use]
    pub fn exporter(&self) -> UltralyticsExporter {
        UltralyticsExporter::new(self.runtime.clone())
    }
}
