use crate::job::RunId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Train,
    Export,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Train => "train",
            Self::Export => "export",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { run_id: RunId, stage: Stage },
    /// One resolved input, printed before the framework is invoked.
    Parameter { run_id: RunId, stage: Stage, name: String, value: String },
    Message { run_id: RunId, stage: Stage, message: String },
    Warning { run_id: RunId, stage: Stage, message: String },
    Finished { run_id: RunId, stage: Stage, artifact: PathBuf },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id, stage } => {
                println!("[{stage}:{}] started", run_id.short());
            }
            ProgressEvent::Parameter { run_id, stage, name, value } => {
                println!("[{stage}:{}] {name:<18}: {value}", run_id.short());
            }
            ProgressEvent::Message { run_id, stage, message } => {
                println!("[{stage}:{}] {message}", run_id.short());
            }
            ProgressEvent::Warning { run_id, stage, message } => {
                println!("[{stage}:{}] warning: {message}", run_id.short());
            }
            ProgressEvent::Finished { run_id, stage, artifact } => {
                println!("[{stage}:{}] finished: {}", run_id.short(), artifact.display());
            }
        }
    }
}

/// Discards every event. Used by `--json` output, where stdout carries the report.
#[derive(Debug, Default)]
pub struct SilentProgressSink;

impl ProgressSink for SilentProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}
