use crate::error::PipelineResult;
use crate::job::ExportParams;
use crate::progress::ProgressSink;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A converted artifact at a location chosen by the export framework.
///
/// The pipeline copies it to the destination and then discards it; it never
/// assumes anything about the file name.
#[derive(Debug)]
pub struct TemporaryArtifactHandle {
    path: PathBuf,
}

impl TemporaryArtifactHandle {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the file where the framework wrote it.
    #[must_use]
    pub fn keep(self) -> PathBuf {
        self.path
    }

    /// Remove the intermediate file. Already-missing files are not an error.
    pub fn discard(self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A graph-export framework the pipeline can delegate conversion to.
#[async_trait]
pub trait Exporter: Send + Sync {
    fn id(&self) -> &'static str;

    /// Convert `checkpoint`. Operator simplification must be enabled.
    async fn convert(
        &self,
        checkpoint: &Path,
        params: &ExportParams,
        progress: &dyn ProgressSink,
    ) -> PipelineResult<TemporaryArtifactHandle>;
}
