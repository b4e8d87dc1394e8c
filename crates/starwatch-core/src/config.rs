//! Configuration file support.
//!
//! Precedence, highest first:
//! 1. CLI arguments (handled by clap in the binary)
//! 2. Environment variables (`STARWATCH_ROOT`, `STARWATCH_PYTHON`, `STARWATCH_LOG_LEVEL`)
//! 3. Local config file (`./starwatch.toml`) or the file given with `--config`
//! 4. Global config file (`~/.starwatch/config.toml`)
//! 5. Built-in defaults
//!
//! Relative paths inside a config file are resolved against the project root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_ROOT: &str = "STARWATCH_ROOT";
pub const ENV_PYTHON: &str = "STARWATCH_PYTHON";
pub const ENV_LOG_LEVEL: &str = "STARWATCH_LOG_LEVEL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarwatchConfig {
    /// Project root every default path is derived from.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub train: TrainDefaults,

    #[serde(default)]
    pub export: ExportDefaults,
}

/// How to reach the Python interpreter that has Ultralytics installed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub python: Option<PathBuf>,

    /// Virtualenv whose interpreter is used when `python` is unset.
    #[serde(default)]
    pub venv: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainDefaults {
    #[serde(default)]
    pub data: Option<PathBuf>,
    #[serde(default)]
    pub epochs: Option<u32>,
    #[serde(default)]
    pub imgsz: Option<u32>,
    #[serde(default)]
    pub batch: Option<u32>,
    #[serde(default)]
    pub workers: Option<u32>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default)]
    pub run_name: Option<String>,
    #[serde(default)]
    pub project: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDefaults {
    #[serde(default)]
    pub weights: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub imgsz: Option<u32>,
    #[serde(default)]
    pub dynamic: Option<bool>,
    #[serde(default)]
    pub opset: Option<u32>,
    #[serde(default)]
    pub keep_intermediate: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl StarwatchConfig {
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    #[must_use]
    pub fn default_global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".starwatch").join("config.toml"))
    }

    #[must_use]
    pub fn default_local_path() -> PathBuf {
        PathBuf::from("starwatch.toml")
    }

    /// Load the global file, then `explicit` (which must exist) or the local file on top.
    ///
    /// Missing implicit files are skipped; unparsable ones are errors.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(global) = Self::default_global_path() {
            if global.is_file() {
                config.merge(Self::load_from_file(&global)?);
                tracing::debug!(path = %global.display(), "loaded global config");
            }
        }

        match explicit {
            Some(path) => {
                config.merge(Self::load_from_file(path)?);
                tracing::debug!(path = %path.display(), "loaded config");
            }
            None => {
                let local = Self::default_local_path();
                if local.is_file() {
                    config.merge(Self::load_from_file(&local)?);
                    tracing::debug!(path = %local.display(), "loaded local config");
                }
            }
        }

        Ok(config)
    }

    /// Values set in `other` override values in `self`.
    pub fn merge(&mut self, other: Self) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.root, other.root);
        take(&mut self.log_level, other.log_level);

        take(&mut self.runtime.python, other.runtime.python);
        take(&mut self.runtime.venv, other.runtime.venv);

        let (t, o) = (&mut self.train, other.train);
        take(&mut t.data, o.data);
        take(&mut t.epochs, o.epochs);
        take(&mut t.imgsz, o.imgsz);
        take(&mut t.batch, o.batch);
        take(&mut t.workers, o.workers);
        take(&mut t.device, o.device);
        take(&mut t.base_model, o.base_model);
        take(&mut t.run_name, o.run_name);
        take(&mut t.project, o.project);
        take(&mut t.output, o.output);

        let (e, o) = (&mut self.export, other.export);
        take(&mut e.weights, o.weights);
        take(&mut e.output, o.output);
        take(&mut e.imgsz, o.imgsz);
        take(&mut e.dynamic, o.dynamic);
        take(&mut e.opset, o.opset);
        take(&mut e.keep_intermediate, o.keep_intermediate);
    }

    /// Apply environment overrides read through `lookup` (normally `std::env::var`).
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = non_empty(ENV_ROOT) {
            self.root = Some(PathBuf::from(root));
        }
        if let Some(python) = non_empty(ENV_PYTHON) {
            self.runtime.python = Some(PathBuf::from(python));
        }
        if let Some(level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = Some(level);
        }
        self
    }

    /// Read the process environment.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(|key| std::env::var(key).ok())
    }
}

/// Join `path` onto `root` unless it is already absolute.
#[must_use]
pub fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { root.join(path) }
}
