use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Stable identifier for a dataset descriptor (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

/// Class names as written in `data.yaml`: either a list or an index map.
///
/// Entries may be any YAML scalar (`names: [0, 1]` is valid).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ClassNames {
    List(Vec<serde_yaml::Value>),
    Map(BTreeMap<u32, serde_yaml::Value>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    nc: Option<usize>,
    #[serde(default)]
    names: Option<ClassNames>,
}

/// The parts of a YOLO dataset descriptor the pipeline checks before training.
///
/// Image and label locations are left to the training framework; only the
/// class list is interpreted here, with the same rules the framework applies.
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub file: PathBuf,
    pub id: DatasetId,
    pub names: Vec<String>,
}

impl DatasetDescriptor {
    /// Read and check a descriptor file.
    ///
    /// Either `names` or `nc` must be present. With `nc` alone the classes are
    /// named `class0`, `class1`, ...
    pub fn inspect(file: &Path) -> PipelineResult<Self> {
        let bytes = match std::fs::read(file) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::Dataset(format!(
                    "dataset descriptor not found: {}",
                    file.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let raw: RawDescriptor = serde_yaml::from_slice(&bytes).map_err(|e| {
            PipelineError::Dataset(format!("{}: {e}", file.display()))
        })?;

        let names = match raw.names {
            Some(ClassNames::List(names)) => names
                .iter()
                .map(|value| scalar_name(file, value))
                .collect::<PipelineResult<Vec<_>>>()?,
            Some(ClassNames::Map(map)) => {
                for (expected, idx) in map.keys().enumerate() {
                    if *idx as usize != expected {
                        return Err(PipelineError::Dataset(format!(
                            "{}: class indices must be contiguous from 0 (missing {expected})",
                            file.display()
                        )));
                    }
                }
                map.values().map(|value| scalar_name(file, value)).collect::<PipelineResult<Vec<_>>>()?
            }
            None => match raw.nc {
                Some(nc) => (0..nc).map(|i| format!("class{i}")).collect(),
                None => Vec::new(),
            },
        };

        if names.is_empty() {
            return Err(PipelineError::Dataset(format!(
                "{}: declares neither class names nor nc",
                file.display()
            )));
        }
        if let Some(nc) = raw.nc {
            if nc != names.len() {
                return Err(PipelineError::Dataset(format!(
                    "{}: nc is {nc} but {} class names are listed",
                    file.display(),
                    names.len()
                )));
            }
        }

        Ok(Self { file: file.to_path_buf(), id: compute_dataset_id(&bytes), names })
    }
}

fn scalar_name(file: &Path, value: &serde_yaml::Value) -> PipelineResult<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(PipelineError::Dataset(format!(
            "{}: class name must be a scalar, found {other:?}",
            file.display()
        ))),
    }
}

#[must_use]
pub fn compute_dataset_id(descriptor: &[u8]) -> DatasetId {
    let mut hasher = Sha256::new();
    hasher.update(descriptor);
    DatasetId(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(temp: &TempDir, body: &str) -> PathBuf {
        let path = temp.path().join("data.yaml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_inspect_list_names() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "path: ../datasets/sky\ntrain: images/train\nval: images/val\nnames: [drone, bird]\n");

        let d = DatasetDescriptor::inspect(&path).unwrap();
        assert_eq!(d.names, vec!["drone", "bird"]);
        assert_eq!(d.file, path);
    }

    #[test]
    fn test_inspect_map_names() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "train: a\nval: b\nnc: 2\nnames:\n  0: drone\n  1: bird\n");

        let d = DatasetDescriptor::inspect(&path).unwrap();
        assert_eq!(d.names, vec!["drone", "bird"]);
    }

    #[test]
    fn test_inspect_rejects_gap_in_map() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "names:\n  0: drone\n  2: bird\n");
        assert!(matches!(DatasetDescriptor::inspect(&path), Err(PipelineError::Dataset(_))));
    }

    #[test]
    fn test_inspect_rejects_nc_mismatch_and_missing_names() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "nc: 3\nnames: [drone, bird]\n");
        assert!(DatasetDescriptor::inspect(&path).is_err());

        let path = write(&temp, "train: images/train\n");
        let err = DatasetDescriptor::inspect(&path).unwrap_err();
        assert!(err.to_string().contains("neither class names nor nc"));
    }

    #[test]
    fn test_inspect_nc_without_names_generates_class_names() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "train: images/train\nval: images/val\nnc: 2\n");

        let d = DatasetDescriptor::inspect(&path).unwrap();
        assert_eq!(d.names, vec!["class0", "class1"]);
    }

    #[test]
    fn test_inspect_accepts_numeric_names() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "train: a\nval: b\nnames: [0, 1]\n");
        assert_eq!(DatasetDescriptor::inspect(&path).unwrap().names, vec!["0", "1"]);

        let path = write(&temp, "names:\n  0: 7\n  1: sat\n");
        assert_eq!(DatasetDescriptor::inspect(&path).unwrap().names, vec!["7", "sat"]);
    }

    #[test]
    fn test_inspect_rejects_nested_class_name() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "names: [[a, b], c]\n");
        assert!(matches!(DatasetDescriptor::inspect(&path), Err(PipelineError::Dataset(_))));
    }

    #[test]
    fn test_inspect_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = DatasetDescriptor::inspect(&temp.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("dataset descriptor not found"));
    }

    #[test]
    fn test_dataset_id_stable_for_same_content() {
        assert_eq!(compute_dataset_id(b"names: [a]"), compute_dataset_id(b"names: [a]"));
        assert_ne!(compute_dataset_id(b"names: [a]"), compute_dataset_id(b"names: [b]"));
    }
}
