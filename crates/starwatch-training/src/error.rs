use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid run spec: {0}")]
    InvalidSpec(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    /// An input artifact produced by an earlier stage is absent.
    #[error("missing prerequisite artifact: {}\n{remedy}", .path.display())]
    MissingPrerequisite { path: PathBuf, remedy: String },

    /// The delegated framework returned but the expected artifact is not there.
    #[error("artifact not produced: {} ({reason})", .path.display())]
    ArtifactNotProduced { path: PathBuf, reason: String },

    #[error("framework error: {0}")]
    Framework(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Error raised when the export source checkpoint does not exist.
    #[must_use]
    pub fn missing_checkpoint(path: PathBuf) -> Self {
        Self::MissingPrerequisite { path, remedy: "Run `starwatch train` first.".to_string() }
    }
}
