//! The two pipeline stages.
//!
//! Each stage is split in two: `prepare` does every cheap check (spec
//! validation, input files) without touching a framework, and `run`
//! delegates to a [`Trainer`] or [`Exporter`] and relocates the result.
//! Callers acquire the framework handle only after `prepare` succeeded.

use crate::artifacts::{
    install_artifact, make_artifact, ArtifactKind, CheckpointManifest, ExportReport, TrainingReport,
};
use crate::dataset::DatasetDescriptor;
use crate::error::{PipelineError, PipelineResult};
use crate::exporter::Exporter;
use crate::job::{ExportRunSpec, ModelRef, RunId, TrainingRunSpec};
use crate::layout::{best_checkpoint_in, ensure_dir, ensure_parent, manifest_path_for};
use crate::progress::{ProgressEvent, ProgressSink, Stage};
use crate::trainer::Trainer;
use chrono::Utc;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Coarsest modification-time granularity we expect from a filesystem (FAT).
const MTIME_SLACK: Duration = Duration::from_secs(2);

struct Reporter<'a> {
    run_id: RunId,
    stage: Stage,
    sink: &'a dyn ProgressSink,
}

impl Reporter<'_> {
    fn started(&self) {
        self.sink.on_event(ProgressEvent::Started { run_id: self.run_id.clone(), stage: self.stage });
    }

    fn param(&self, name: &str, value: impl ToString) {
        self.sink.on_event(ProgressEvent::Parameter {
            run_id: self.run_id.clone(),
            stage: self.stage,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn message(&self, message: impl Into<String>) {
        self.sink.on_event(ProgressEvent::Message {
            run_id: self.run_id.clone(),
            stage: self.stage,
            message: message.into(),
        });
    }

    fn warning(&self, message: impl Into<String>) {
        self.sink.on_event(ProgressEvent::Warning {
            run_id: self.run_id.clone(),
            stage: self.stage,
            message: message.into(),
        });
    }

    fn finished(&self, artifact: &Path) {
        self.sink.on_event(ProgressEvent::Finished {
            run_id: self.run_id.clone(),
            stage: self.stage,
            artifact: artifact.to_path_buf(),
        });
    }
}

/// A validated training run, ready to be handed to a [`Trainer`].
#[derive(Debug)]
pub struct TrainingStage {
    spec: TrainingRunSpec,
    dataset: DatasetDescriptor,
}

impl TrainingStage {
    /// Relative paths are anchored to the current directory here, so the
    /// framework child sees the same files whatever its working directory.
    pub fn prepare(mut spec: TrainingRunSpec) -> PipelineResult<Self> {
        spec.validate()?;
        spec.data = std::path::absolute(&spec.data)?;
        spec.project = std::path::absolute(&spec.project)?;
        spec.output = std::path::absolute(&spec.output)?;
        // A local checkpoint file; bare names like `yolov8n.pt` are resolved by the framework.
        let base = Path::new(&spec.base_model.0);
        if base.is_relative() && base.is_file() {
            spec.base_model = ModelRef(std::path::absolute(base)?.display().to_string());
        }

        let dataset = DatasetDescriptor::inspect(&spec.data)?;
        Ok(Self { spec, dataset })
    }

    #[must_use]
    pub fn spec(&self) -> &TrainingRunSpec {
        &self.spec
    }

    #[must_use]
    pub fn dataset(&self) -> &DatasetDescriptor {
        &self.dataset
    }

    pub async fn run(self, trainer: &dyn Trainer, progress: &dyn ProgressSink) -> PipelineResult<TrainingReport> {
        let Self { spec, dataset } = self;
        let report = Reporter { run_id: spec.run_id.clone(), stage: Stage::Train, sink: progress };
        let hp = &spec.hyperparams;

        report.started();
        report.param("Base model", &spec.base_model);
        report.param("Data config", spec.data.display());
        report.param("Classes", dataset.names.join(", "));
        report.param("Epochs", hp.epochs);
        report.param("Image size", hp.imgsz);
        report.param("Batch size", hp.batch);
        report.param("Dataloader workers", hp.workers);
        report.param("Device", hp.device.as_deref().unwrap_or("auto"));
        report.param("Run directory", spec.expected_save_dir().display());

        ensure_dir(&spec.project)?;
        ensure_parent(&spec.output)?;

        let started_at = Utc::now();
        let started_clock = SystemTime::now();
        tracing::info!(run_id = %spec.run_id, trainer = trainer.id(), run_name = %spec.run_name, "delegating training");

        let outcome = trainer.train(&spec, progress).await?;

        let save_dir = outcome.save_dir.unwrap_or_else(|| spec.expected_save_dir());
        let best = best_checkpoint_in(&save_dir);
        ensure_fresh(&best, started_clock)?;

        // The manifest goes first: if installing the checkpoint then fails, the
        // old checkpoint no longer matches its sha256 and the manifest is ignored.
        let mut checkpoint = make_artifact(ArtifactKind::Checkpoint, best.clone())?;
        checkpoint.path = spec.output.clone();

        let manifest_path = manifest_path_for(&spec.output);
        let manifest = CheckpointManifest {
            run_id: spec.run_id.clone(),
            started_at,
            finished_at: Utc::now(),
            base_model: spec.base_model.clone(),
            data: spec.data.clone(),
            dataset_id: dataset.id.clone(),
            run_name: spec.run_name.clone(),
            save_dir: save_dir.clone(),
            hyperparams: spec.hyperparams.clone(),
            checkpoint: checkpoint.clone(),
        };
        manifest.write(&manifest_path)?;
        install_artifact(&best, &spec.output)?;

        tracing::info!(run_id = %spec.run_id, checkpoint = %spec.output.display(), sha256 = %checkpoint.sha256, "training complete");
        report.finished(&spec.output);

        Ok(TrainingReport { run_id: spec.run_id, save_dir, checkpoint, manifest: manifest_path })
    }
}

/// `best` must exist and must have been written by the run that started at `started`.
fn ensure_fresh(best: &Path, started: SystemTime) -> PipelineResult<()> {
    let metadata = match std::fs::metadata(best) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            return Err(PipelineError::ArtifactNotProduced {
                path: best.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ArtifactNotProduced {
                path: best.to_path_buf(),
                reason: "missing after training returned".to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let modified = metadata.modified()?;
    if modified + MTIME_SLACK < started {
        return Err(PipelineError::ArtifactNotProduced {
            path: best.to_path_buf(),
            reason: "left over from an earlier run".to_string(),
        });
    }
    Ok(())
}

/// A validated export run whose source checkpoint exists.
#[derive(Debug)]
pub struct ExportStage {
    spec: ExportRunSpec,
    source_manifest: Option<CheckpointManifest>,
}

impl ExportStage {
    pub fn prepare(mut spec: ExportRunSpec) -> PipelineResult<Self> {
        spec.validate()?;
        spec.weights = std::path::absolute(&spec.weights)?;
        spec.output = std::path::absolute(&spec.output)?;

        if !spec.weights.is_file() {
            return Err(PipelineError::missing_checkpoint(spec.weights));
        }

        let source_manifest = CheckpointManifest::load_for(&spec.weights)?;
        Ok(Self { spec, source_manifest })
    }

    #[must_use]
    pub fn spec(&self) -> &ExportRunSpec {
        &self.spec
    }

    /// Training image size recorded for the source checkpoint, if a matching manifest exists.
    #[must_use]
    pub fn trained_imgsz(&self) -> Option<u32> {
        self.source_manifest.as_ref().map(|m| m.hyperparams.imgsz)
    }

    /// `(trained, requested)` when the export image size differs from training.
    #[must_use]
    pub fn imgsz_mismatch(&self) -> Option<(u32, u32)> {
        let trained = self.trained_imgsz()?;
        let requested = self.spec.params.imgsz;
        (trained != requested).then_some((trained, requested))
    }

    pub async fn run(self, exporter: &dyn Exporter, progress: &dyn ProgressSink) -> PipelineResult<ExportReport> {
        let trained_imgsz = self.trained_imgsz();
        let mismatch = self.imgsz_mismatch();
        let spec = self.spec;
        let params = &spec.params;
        let report = Reporter { run_id: spec.run_id.clone(), stage: Stage::Export, sink: progress };

        report.started();
        report.param("Input weights", spec.weights.display());
        report.param("Output graph", spec.output.display());
        report.param("Format", params.format.as_str());
        report.param("Image size", params.imgsz);
        report.param("Dynamic axes", params.dynamic);
        report.param("Opset", params.opset);

        if let Some((trained, requested)) = mismatch {
            tracing::warn!(trained, requested, weights = %spec.weights.display(), "export image size differs from training image size");
            report.warning(format!(
                "checkpoint was trained at imgsz {trained} but is being exported at {requested}; accuracy may degrade"
            ));
        }

        let source = make_artifact(ArtifactKind::Checkpoint, spec.weights.clone())?;

        tracing::info!(run_id = %spec.run_id, exporter = exporter.id(), opset = params.opset, dynamic = params.dynamic, "delegating export");
        let handle = exporter.convert(&spec.weights, params, progress).await?;
        report.message(format!("framework wrote {}", handle.path().display()));

        install_artifact(handle.path(), &spec.output)?;
        let graph = make_artifact(ArtifactKind::InferenceGraph, spec.output.clone())?;

        let intermediate = if same_file(handle.path(), &spec.output) {
            let _ = handle.keep();
            None
        } else if spec.keep_intermediate {
            Some(handle.keep())
        } else {
            let path = handle.path().to_path_buf();
            if let Err(e) = handle.discard() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove intermediate export");
            }
            None
        };

        tracing::info!(run_id = %spec.run_id, graph = %spec.output.display(), sha256 = %graph.sha256, "export complete");
        report.finished(&spec.output);

        Ok(ExportReport {
            run_id: spec.run_id,
            created_at: Utc::now(),
            source,
            graph,
            params: spec.params,
            intermediate,
            trained_imgsz,
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
