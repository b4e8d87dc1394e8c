use crate::error::PipelineResult;
use crate::job::TrainingRunSpec;
use crate::progress::ProgressSink;
use async_trait::async_trait;
use std::path::PathBuf;

/// What the training framework reports back once its loop has returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainOutcome {
    /// Run directory as reported by the framework, if it reported one.
    pub save_dir: Option<PathBuf>,
}

/// A training framework the pipeline can delegate the optimization loop to.
///
/// Implementations must pass every hyperparameter through verbatim and reuse
/// `<project>/<run_name>` on repeated runs rather than creating siblings.
#[async_trait]
pub trait Trainer: Send + Sync {
    fn id(&self) -> &'static str;

    async fn train(
        &self,
        spec: &TrainingRunSpec,
        progress: &dyn ProgressSink,
    ) -> PipelineResult<TrainOutcome>;
}
