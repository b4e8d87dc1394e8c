use crate::config::RuntimeConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use starwatch_training::{PipelineError, PipelineResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::scripts;

/// Python interpreter used to drive Ultralytics as a child process.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    python: PathBuf,
    workdir: PathBuf,
    /// Forward the framework's stdout. Off when stdout carries machine output.
    forward_stdout: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameworkInfo {
    pub version: String,
}

impl PythonRuntime {
    #[must_use]
    pub fn new(python: PathBuf, workdir: PathBuf) -> Self {
        Self { python, workdir, forward_stdout: true }
    }

    /// Pick the interpreter from config: explicit path, then virtualenv, then `python3`.
    ///
    /// A relative virtualenv is resolved against `workdir`; an interpreter name is left for PATH lookup.
    #[must_use]
    pub fn from_config(config: &RuntimeConfig, workdir: PathBuf) -> Self {
        let python = if let Some(python) = &config.python {
            python.clone()
        } else if let Some(venv) = &config.venv {
            let bin_dir = if cfg!(windows) { "Scripts" } else { "bin" };
            crate::config::resolve_against(&workdir, venv).join(bin_dir).join("python")
        } else {
            PathBuf::from("python3")
        };
        Self::new(python, workdir)
    }

    #[must_use]
    pub fn with_forward_stdout(mut self, forward: bool) -> Self {
        self.forward_stdout = forward;
        self
    }

    #[must_use]
    pub fn python(&self) -> &Path {
        &self.python
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Check the interpreter starts and can import Ultralytics.
    pub async fn probe(&self) -> PipelineResult<FrameworkInfo> {
        let output = Command::new(&self.python)
            .args(["-c", scripts::PROBE])
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Framework(format!(
                "ultralytics is not importable by {} (exit {}). Install it with `pip install ultralytics`.\n{}",
                self.python.display(),
                output.status,
                tail(&stderr, 20)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default();
        serde_json::from_str(line)
            .map_err(|e| PipelineError::Framework(format!("unexpected probe output {line:?}: {e}")))
    }

    /// Run a driver script with a JSON request and decode its JSON response.
    pub async fn run_driver<T: DeserializeOwned>(&self, script: &str, request: &serde_json::Value) -> PipelineResult<T> {
        let scratch = tempfile::tempdir()?;
        let response_path = scratch.path().join("response.json");
        let request_json = serde_json::to_string(request)?;

        tracing::debug!(python = %self.python.display(), request = %request_json, "starting framework driver");

        let stdout = if self.forward_stdout { Stdio::inherit() } else { Stdio::null() };
        let status = Command::new(&self.python)
            .arg("-c")
            .arg(script)
            .arg(&request_json)
            .arg(&response_path)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        if !status.success() {
            return Err(PipelineError::Framework(format!(
                "{} exited with {status}",
                self.python.display()
            )));
        }

        let bytes = match std::fs::read(&response_path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::Framework(
                    "framework driver finished without writing a response".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::Framework(format!("malformed framework response: {e}")))
    }

    fn spawn_error(&self, e: &std::io::Error) -> PipelineError {
        PipelineError::Framework(format!("failed to start {}: {e}", self.python.display()))
    }
}

/// Last `lines` lines of `text`.
fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_config_prefers_explicit_python() {
        let config = RuntimeConfig { python: Some(PathBuf::from("/opt/py/bin/python")), venv: Some(PathBuf::from(".venv")) };
        let rt = PythonRuntime::from_config(&config, PathBuf::from("/srv/sw"));
        assert_eq!(rt.python(), Path::new("/opt/py/bin/python"));
    }

    #[test]
    fn test_from_config_uses_venv_relative_to_workdir() {
        let config = RuntimeConfig { python: None, venv: Some(PathBuf::from(".venv")) };
        let rt = PythonRuntime::from_config(&config, PathBuf::from("/srv/sw"));
        assert!(rt.python().starts_with("/srv/sw/.venv"));
        assert!(rt.python().ends_with("python"));
    }

    #[test]
    fn test_from_config_defaults_to_python3() {
        let rt = PythonRuntime::from_config(&RuntimeConfig::default(), PathBuf::from("."));
        assert_eq!(rt.python(), Path::new("python3"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_a_framework_error() {
        let temp = TempDir::new().unwrap();
        let rt = PythonRuntime::new(temp.path().join("no-such-python"), temp.path().to_path_buf());

        let err = rt.probe().await.unwrap_err();
        assert!(matches!(err, PipelineError::Framework(_)));
        assert!(err.to_string().contains("failed to start"));

        let err = rt.run_driver::<serde_json::Value>(scripts::TRAIN, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, PipelineError::Framework(_)));
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
    }
}
