use crate::dataset::DatasetId;
use crate::error::{PipelineError, PipelineResult};
use crate::job::{ExportParams, ModelRef, RunId, TrainingHyperParams};
use crate::layout::{ensure_parent, manifest_path_for};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Checkpoint,
    InferenceGraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

pub fn sha256_file(path: &Path) -> PipelineResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn make_artifact(kind: ArtifactKind, path: PathBuf) -> PipelineResult<ArtifactRecord> {
    if !path.is_file() {
        return Err(PipelineError::ArtifactNotProduced {
            path,
            reason: "not a file".to_string(),
        });
    }

    let bytes = std::fs::metadata(&path)?.len();
    let sha256 = sha256_file(&path)?;
    Ok(ArtifactRecord { kind, path, sha256, bytes })
}

/// Copy `src` to `dest` with its permissions and modification time.
///
/// The bytes are staged in a temporary file next to `dest` and renamed over
/// it, so `dest` is either the old file or the complete new one. Missing
/// parent directories are created.
pub fn install_artifact(src: &Path, dest: &Path) -> PipelineResult<u64> {
    let metadata = std::fs::metadata(src)?;
    ensure_parent(dest)?;

    let mut staged = NamedTempFile::new_in(staging_dir(dest))?;
    let mut reader = File::open(src)?;
    let copied = std::io::copy(&mut reader, staged.as_file_mut())?;

    let file = staged.as_file();
    if let Ok(modified) = metadata.modified() {
        file.set_modified(modified)?;
    }
    file.set_permissions(metadata.permissions())?;
    file.sync_all()?;

    staged.persist(dest).map_err(|e| e.error)?;
    tracing::debug!(src = %src.display(), dest = %dest.display(), bytes = copied, "installed artifact");
    Ok(copied)
}

/// Directory holding `dest`, where its replacement is staged before the rename.
fn staging_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Record written beside a copied checkpoint describing the run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointManifest {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub base_model: ModelRef,
    pub data: PathBuf,
    pub dataset_id: DatasetId,
    pub run_name: String,
    pub save_dir: PathBuf,
    pub hyperparams: TrainingHyperParams,
    pub checkpoint: ArtifactRecord,
}

impl CheckpointManifest {
    /// Replace `path` atomically with this manifest.
    pub fn write(&self, path: &Path) -> PipelineResult<()> {
        ensure_parent(path)?;
        let json = serde_json::to_vec_pretty(self)?;

        let mut staged = NamedTempFile::new_in(staging_dir(path))?;
        staged.write_all(&json)?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn read(path: &Path) -> PipelineResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Load the sidecar manifest for `checkpoint` if it describes that exact file.
    ///
    /// The manifest is advisory: a missing, unreadable or outdated one yields `None`.
    pub fn load_for(checkpoint: &Path) -> PipelineResult<Option<Self>> {
        let path = manifest_path_for(checkpoint);
        if !path.is_file() {
            return Ok(None);
        }

        let manifest = match Self::read(&path) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(manifest = %path.display(), error = %e, "ignoring unreadable checkpoint manifest");
                return Ok(None);
            }
        };

        let sha256 = sha256_file(checkpoint)?;
        if manifest.checkpoint.sha256 != sha256 {
            tracing::debug!(manifest = %path.display(), "checkpoint manifest describes a different file");
            return Ok(None);
        }
        Ok(Some(manifest))
    }
}

/// Outcome of a successful training stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: RunId,
    pub save_dir: PathBuf,
    pub checkpoint: ArtifactRecord,
    pub manifest: PathBuf,
}

/// Outcome of a successful export stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
    pub source: ArtifactRecord,
    pub graph: ArtifactRecord,
    pub params: ExportParams,
    /// Framework-chosen intermediate, if it was kept.
    pub intermediate: Option<PathBuf>,
    /// Training image size recorded for the source checkpoint, when known.
    pub trained_imgsz: Option<u32>,
}
