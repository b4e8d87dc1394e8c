//! Command implementations for the STARWATCH-X CLI.

pub mod export;
pub mod train;
pub mod types;

pub use types::{ExportArgs, TrainArgs};

use starwatch_core::{PythonRuntime, StarwatchConfig};
use starwatch_training::{PipelineLayout, ProgressSink, SilentProgressSink, StdoutProgressSink};
use std::path::{Path, PathBuf};

/// Resolved global settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub layout: PipelineLayout,
    pub config: StarwatchConfig,
}

impl CommandContext {
    #[must_use]
    pub fn new(root: &Path, config: StarwatchConfig) -> Self {
        Self { layout: PipelineLayout::for_project_root(root), config }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// A path taken from the config file, relative to the project root.
    #[must_use]
    pub fn config_path(&self, path: &Path) -> PathBuf {
        starwatch_core::config::resolve_against(self.root(), path)
    }

    /// Interpreter handle; stdout forwarding is off when stdout carries JSON.
    #[must_use]
    pub fn runtime(&self, json_output: bool) -> PythonRuntime {
        PythonRuntime::from_config(&self.config.runtime, self.root().to_path_buf()).with_forward_stdout(!json_output)
    }
}

/// Pick a CLI path, else a config path (root-relative), else the layout default.
fn pick_path(cli: Option<&PathBuf>, config: Option<&PathBuf>, ctx: &CommandContext, default: PathBuf) -> PathBuf {
    match (cli, config) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => ctx.config_path(p),
        (None, None) => default,
    }
}

fn progress_sink(json_output: bool) -> Box<dyn ProgressSink> {
    if json_output { Box::new(SilentProgressSink) } else { Box::new(StdoutProgressSink) }
}
