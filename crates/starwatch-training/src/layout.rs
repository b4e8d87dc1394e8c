use crate::error::PipelineResult;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_MODEL: &str = "yolov8n.pt";
pub const DEFAULT_RUN_NAME: &str = "starwatchx";
pub const EXPORTED_MODEL_FILE: &str = "starwatchx_yolov8.onnx";

/// Filesystem layout for the model pipeline inside a project checkout.
///
/// Every default is derived from `root`; nothing depends on the process
/// working directory or the install location of the binary.
///
/// ```text
/// <root>/python-ml/data.yaml
/// <root>/python-ml/runs/<run_name>/weights/best.pt
/// <root>/python-ml/weights/best.pt
/// <root>/java-engine/src/main/resources/model/starwatchx_yolov8.onnx
/// ```
#[derive(Debug, Clone)]
pub struct PipelineLayout {
    root: PathBuf,
}

impl PipelineLayout {
    #[must_use]
    pub fn for_project_root(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn python_ml_dir(&self) -> PathBuf {
        self.root.join("python-ml")
    }

    #[must_use]
    pub fn data_config(&self) -> PathBuf {
        self.python_ml_dir().join("data.yaml")
    }

    #[must_use]
    pub fn runs_dir(&self) -> PathBuf {
        self.python_ml_dir().join("runs")
    }

    #[must_use]
    pub fn weights_dir(&self) -> PathBuf {
        self.python_ml_dir().join("weights")
    }

    /// Stable checkpoint location shared by both stages.
    #[must_use]
    pub fn checkpoint(&self) -> PathBuf {
        self.weights_dir().join("best.pt")
    }

    /// Model resource directory of the inference engine.
    #[must_use]
    pub fn engine_model_dir(&self) -> PathBuf {
        self.root
            .join("java-engine")
            .join("src")
            .join("main")
            .join("resources")
            .join("model")
    }

    #[must_use]
    pub fn exported_model(&self) -> PathBuf {
        self.engine_model_dir().join(EXPORTED_MODEL_FILE)
    }
}

/// `weights/best.pt` inside a framework run directory.
#[must_use]
pub fn best_checkpoint_in(save_dir: &Path) -> PathBuf {
    save_dir.join("weights").join("best.pt")
}

/// Sidecar manifest path for a copied checkpoint: `best.pt` -> `best.manifest.json`.
#[must_use]
pub fn manifest_path_for(checkpoint: &Path) -> PathBuf {
    checkpoint.with_extension("manifest.json")
}

/// Create `dir` and all its parents. Succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Create the parent directory of `path`, if it has one.
pub fn ensure_parent(path: &Path) -> PipelineResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
