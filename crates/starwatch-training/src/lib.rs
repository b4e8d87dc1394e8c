//! STARWATCH-X model pipeline
//!
//! Framework-agnostic contract between the two lifecycle stages:
//! - Describing runs (`TrainingRunSpec`, `ExportRunSpec`)
//! - Default artifact locations (`PipelineLayout`)
//! - Checking dataset descriptors before training
//! - Relocating artifacts atomically and recording checkpoint manifests
//! - Framework capabilities (`Trainer`, `Exporter`) and the stages that drive them

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod exporter;
pub mod job;
pub mod layout;
pub mod pipeline;
pub mod progress;
pub mod trainer;

pub use artifacts::{
    install_artifact, make_artifact, sha256_file, ArtifactKind, ArtifactRecord, CheckpointManifest, ExportReport,
    TrainingReport,
};
pub use dataset::{DatasetDescriptor, DatasetId};
pub use error::{PipelineError, PipelineResult};
pub use exporter::{Exporter, TemporaryArtifactHandle};
pub use job::{ExportFormat, ExportParams, ExportRunSpec, ModelRef, RunId, TrainingHyperParams, TrainingRunSpec};
pub use layout::{best_checkpoint_in, manifest_path_for, PipelineLayout, DEFAULT_BASE_MODEL, DEFAULT_RUN_NAME};
pub use pipeline::{ExportStage, TrainingStage};
pub use progress::{ProgressEvent, ProgressSink, SilentProgressSink, Stage, StdoutProgressSink};
pub use trainer::{TrainOutcome, Trainer};
