use super::runtime::PythonRuntime;
use super::scripts;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use starwatch_training::{
    ExportParams, Exporter, PipelineError, PipelineResult, ProgressSink, TemporaryArtifactHandle,
};
use std::path::{Path, PathBuf};

/// Converts a YOLO checkpoint with `YOLO(weights).export(...)`.
#[derive(Debug, Clone)]
pub struct UltralyticsExporter {
    runtime: PythonRuntime,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    path: Option<PathBuf>,
}

impl UltralyticsExporter {
    #[must_use]
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

pub(crate) fn export_request(checkpoint: &Path, params: &ExportParams) -> serde_json::Value {
    json!({
        "model": checkpoint,
        "format": params.format.as_str(),
        "imgsz": params.imgsz,
        "dynamic": params.dynamic,
        "simplify": ExportParams::SIMPLIFY,
        "opset": params.opset,
    })
}

#[async_trait]
impl Exporter for UltralyticsExporter {
    fn id(&self) -> &'static str {
        "ultralytics"
    }

    async fn convert(
        &self,
        checkpoint: &Path,
        params: &ExportParams,
        _progress: &dyn ProgressSink,
    ) -> PipelineResult<TemporaryArtifactHandle> {
        let request = export_request(checkpoint, params);
        let response: ExportResponse = self.runtime.run_driver(scripts::EXPORT, &request).await?;

        let path = response
            .path
            .map(|p| crate::config::resolve_against(self.runtime.workdir(), &p))
            .ok_or_else(|| PipelineError::Framework("export returned no artifact path".to_string()))?;

        if !path.is_file() {
            return Err(PipelineError::ArtifactNotProduced {
                path,
                reason: "reported by the exporter but not on disk".to_string(),
            });
        }
        Ok(TemporaryArtifactHandle::new(path))
    }
}
