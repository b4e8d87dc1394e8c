//! Command argument definitions shared between main.rs and the command modules.
//!
//! Every value flag is optional so that config-file values can fill the gaps;
//! the documented defaults apply when neither is set.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// Path to data.yaml describing the dataset [default: <root>/python-ml/data.yaml]
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Number of training epochs [default: 10]
    #[arg(long)]
    pub epochs: Option<u32>,

    /// Image size for training [default: 640]
    #[arg(long)]
    pub imgsz: Option<u32>,

    /// Batch size [default: 16]
    #[arg(long)]
    pub batch: Option<u32>,

    /// Number of dataloader workers [default: 4]
    #[arg(long)]
    pub workers: Option<u32>,

    /// Device override, e.g. '0', '0,1' or 'cpu' [default: framework auto-select]
    #[arg(long)]
    pub device: Option<String>,

    /// Base YOLOv8 checkpoint to fine-tune [default: yolov8n.pt]
    #[arg(long)]
    pub base_model: Option<String>,

    /// Where to copy the best weights after training [default: <root>/python-ml/weights/best.pt]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Name of the run folder [default: starwatchx]
    #[arg(long)]
    pub run_name: Option<String>,

    /// Parent directory for runs [default: <root>/python-ml/runs]
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Print the training report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Trained weights to convert [default: <root>/python-ml/weights/best.pt]
    #[arg(long)]
    pub weights: Option<PathBuf>,

    /// Destination ONNX path for the inference engine
    /// [default: <root>/java-engine/src/main/resources/model/starwatchx_yolov8.onnx]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Image size, should match training [default: 640]
    #[arg(long)]
    pub imgsz: Option<u32>,

    /// Enable dynamic input axes (slightly slower but flexible)
    #[arg(long)]
    pub dynamic: bool,

    /// ONNX opset version [default: 12]
    #[arg(long)]
    pub opset: Option<u32>,

    /// Keep the framework's intermediate export file
    #[arg(long)]
    pub keep_intermediate: bool,

    /// Print the export report as JSON
    #[arg(long)]
    pub json: bool,
}
