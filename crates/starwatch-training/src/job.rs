use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier for a single stage invocation, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// First eight characters, enough to tell concurrent runs apart in output.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to a pretrained starting checkpoint (e.g. `yolov8n.pt`).
///
/// The framework resolves and versions it; we pass it through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef(pub String);

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingHyperParams {
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub workers: u32,
    /// Device override passed verbatim (`"0"`, `"0,1"`, `"cpu"`, `"mps"`).
    /// `None` lets the framework pick.
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for TrainingHyperParams {
    fn default() -> Self {
        Self { epochs: 10, imgsz: 640, batch: 16, workers: 4, device: None }
    }
}

impl TrainingHyperParams {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.epochs == 0 {
            return Err(PipelineError::InvalidSpec("epochs must be >= 1".to_string()));
        }
        if self.imgsz == 0 {
            return Err(PipelineError::InvalidSpec("imgsz must be >= 1".to_string()));
        }
        if self.batch == 0 {
            return Err(PipelineError::InvalidSpec("batch must be >= 1".to_string()));
        }
        if let Some(device) = &self.device {
            if device.trim().is_empty() {
                return Err(PipelineError::InvalidSpec("device must not be blank when set".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRunSpec {
    pub run_id: RunId,
    pub base_model: ModelRef,
    /// Dataset descriptor (`data.yaml`).
    pub data: PathBuf,
    pub hyperparams: TrainingHyperParams,
    /// Name of the framework run folder under `project`.
    pub run_name: String,
    /// Parent directory for framework runs.
    pub project: PathBuf,
    /// Where the best checkpoint is copied after training.
    pub output: PathBuf,
}

impl TrainingRunSpec {
    #[must_use]
    pub fn new(base_model: ModelRef, data: PathBuf, run_name: String, project: PathBuf, output: PathBuf) -> Self {
        Self {
            run_id: RunId::new(),
            base_model,
            data,
            hyperparams: TrainingHyperParams::default(),
            run_name,
            project,
            output,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.base_model.0.trim().is_empty() {
            return Err(PipelineError::InvalidSpec("base_model is required".to_string()));
        }
        validate_run_name(&self.run_name)?;
        if self.output.file_name().is_none() {
            return Err(PipelineError::InvalidSpec(format!(
                "output must name a file: {}",
                self.output.display()
            )));
        }
        self.hyperparams.validate()?;
        Ok(())
    }

    /// Save directory the framework uses when it does not report one.
    #[must_use]
    pub fn expected_save_dir(&self) -> PathBuf {
        self.project.join(&self.run_name)
    }
}

fn validate_run_name(name: &str) -> PipelineResult<()> {
    if name.trim().is_empty() {
        return Err(PipelineError::InvalidSpec("run_name is required".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PipelineError::InvalidSpec(format!(
            "run_name must be a single path component: {name}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Onnx,
}

impl ExportFormat {
    /// Format name understood by the export framework.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
        }
    }
}

/// Conversion settings handed to the exporter.
///
/// Operator simplification is not a field: it is always on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParams {
    pub format: ExportFormat,
    pub imgsz: u32,
    /// Parameterize the input shape instead of fixing it to `imgsz`.
    pub dynamic: bool,
    pub opset: u32,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self { format: ExportFormat::Onnx, imgsz: 640, dynamic: false, opset: 12 }
    }
}

impl ExportParams {
    pub const SIMPLIFY: bool = true;

    pub fn validate(&self) -> PipelineResult<()> {
        if self.imgsz == 0 {
            return Err(PipelineError::InvalidSpec("imgsz must be >= 1".to_string()));
        }
        if self.opset == 0 {
            return Err(PipelineError::InvalidSpec("opset must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRunSpec {
    pub run_id: RunId,
    /// Checkpoint produced by the training stage.
    pub weights: PathBuf,
    /// Destination graph path, usually inside the inference engine's resources.
    pub output: PathBuf,
    pub params: ExportParams,
    /// Leave the framework's intermediate file in place after relocation.
    #[serde(default)]
    pub keep_intermediate: bool,
}

impl ExportRunSpec {
    #[must_use]
    pub fn new(weights: PathBuf, output: PathBuf) -> Self {
        Self {
            run_id: RunId::new(),
            weights,
            output,
            params: ExportParams::default(),
            keep_intermediate: false,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.output.file_name().is_none() {
            return Err(PipelineError::InvalidSpec(format!(
                "output must name a file: {}",
                self.output.display()
            )));
        }
        self.params.validate()
    }
}
