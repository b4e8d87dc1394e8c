use super::runtime::PythonRuntime;
use super::scripts;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use starwatch_training::{PipelineResult, ProgressSink, TrainOutcome, Trainer, TrainingRunSpec};
use std::path::PathBuf;

/// Fine-tunes a YOLO checkpoint with `YOLO(model).train(...)`.
#[derive(Debug, Clone)]
pub struct UltralyticsTrainer {
    runtime: PythonRuntime,
}

#[derive(Debug, Deserialize)]
struct TrainResponse {
    save_dir: Option<PathBuf>,
}

impl UltralyticsTrainer {
    #[must_use]
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

/// Keyword arguments for `model.train`. `exist_ok` is pinned so reruns reuse the run folder.
pub(crate) fn train_request(spec: &TrainingRunSpec) -> serde_json::Value {
    let hp = &spec.hyperparams;
    json!({
        "model": spec.base_model.0,
        "data": spec.data,
        "epochs": hp.epochs,
        "imgsz": hp.imgsz,
        "batch": hp.batch,
        "workers": hp.workers,
        "project": spec.project,
        "name": spec.run_name,
        "exist_ok": true,
        "device": hp.device,
    })
}

#[async_trait]
impl Trainer for UltralyticsTrainer {
    fn id(&self) -> &'static str {
        "ultralytics"
    }

    async fn train(&self, spec: &TrainingRunSpec, _progress: &dyn ProgressSink) -> PipelineResult<TrainOutcome> {
        let request = train_request(spec);
        let response: TrainResponse = self.runtime.run_driver(scripts::TRAIN, &request).await?;

        let save_dir = response.save_dir.map(|dir| crate::config::resolve_against(self.runtime.workdir(), &dir));
        tracing::debug!(save_dir = ?save_dir, "framework reported save directory");
        Ok(TrainOutcome { save_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starwatch_training::ModelRef;

    #[test]
    fn test_train_request_passes_hyperparams_verbatim() {
        let mut spec = TrainingRunSpec::new(
            ModelRef("yolov8s.pt".to_string()),
            PathBuf::from("/p/python-ml/data.yaml"),
            "t1".to_string(),
            PathBuf::from("/p/python-ml/runs"),
            PathBuf::from("/p/python-ml/weights/best.pt"),
        );
        spec.hyperparams.epochs = 1;
        spec.hyperparams.batch = 2;
        spec.hyperparams.device = Some("cpu".to_string());

        let req = train_request(&spec);

        assert_eq!(req["model"], "yolov8s.pt");
        assert_eq!(req["data"], "/p/python-ml/data.yaml");
        assert_eq!(req["epochs"], 1);
        assert_eq!(req["imgsz"], 640);
        assert_eq!(req["batch"], 2);
        assert_eq!(req["workers"], 4);
        assert_eq!(req["project"], "/p/python-ml/runs");
        assert_eq!(req["name"], "t1");
        assert_eq!(req["exist_ok"], true);
        assert_eq!(req["device"], "cpu");
    }

    #[test]
    fn test_train_request_leaves_device_to_framework() {
        let spec = TrainingRunSpec::new(
            ModelRef("yolov8n.pt".to_string()),
            PathBuf::from("data.yaml"),
            "t1".to_string(),
            PathBuf::from("runs"),
            PathBuf::from("best.pt"),
        );
        assert!(train_request(&spec)["device"].is_null());
    }

    #[test]
    fn test_train_response_accepts_null_save_dir() {
        let r: TrainResponse = serde_json::from_str(r#"{"save_dir": null}"#).unwrap();
        assert!(r.save_dir.is_none());
        let r: TrainResponse = serde_json::from_str(r#"{"save_dir": "/p/python-ml/runs/t1"}"#).unwrap();
        assert_eq!(r.save_dir, Some(PathBuf::from("/p/python-ml/runs/t1")));
    }
}
