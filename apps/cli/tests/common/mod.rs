//! Shared helpers for the `starwatch` CLI integration tests.

// Not every test file uses every helper.
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A `starwatch` invocation isolated from the developer's environment.
pub fn starwatch(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("starwatch").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("STARWATCH_ROOT")
        .env_remove("STARWATCH_PYTHON")
        .env_remove("STARWATCH_LOG_LEVEL");
    cmd
}

/// Lay out `python-ml/data.yaml` with a two-class dataset under `root`.
pub fn write_dataset(root: &Path) -> PathBuf {
    let dir = root.join("python-ml");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("data.yaml");
    fs::write(&path, "path: datasets/sky\ntrain: images/train\nval: images/val\nnc: 2\nnames: [satellite, debris]\n")
        .unwrap();
    path
}

/// Engine resource path the export stage writes by default.
pub fn engine_model(root: &Path) -> PathBuf {
    root.join("java-engine/src/main/resources/model/starwatchx_yolov8.onnx")
}

/// Shell script standing in for a Python interpreter with Ultralytics.
///
/// It answers the version check, and for the train and export drivers it
/// reads the JSON request, writes the artifact where the framework would and
/// writes the JSON response. Training fails unless the dataset path resolves
/// from the child's working directory. Chatter goes to stdout like real
/// framework output.
const FAKE_PYTHON: &str = r##"#!/bin/sh
field() {
    printf '%s' "$1" | sed -n "s/.*\"$2\":\"\([^\"]*\)\".*/\1/p"
}

case "$2" in
    *model.train*)
        data=$(field "$3" data)
        project=$(field "$3" project)
        name=$(field "$3" name)
        if [ ! -f "$data" ]; then
            echo "dataset not found from $(pwd): $data" >&2
            exit 3
        fi
        echo "Epoch 1/1 fake-training"
        mkdir -p "$project/$name/weights"
        printf 'trained weights' > "$project/$name/weights/best.pt"
        printf '{"save_dir":"%s/%s"}' "$project" "$name" > "$4"
        ;;
    *model.export*)
        model=$(field "$3" model)
        out="${model%.pt}.onnx"
        echo "fake-export to $out"
        printf 'onnx graph' > "$out"
        printf '{"path":"%s"}' "$out" > "$4"
        ;;
    *)
        echo "fake interpreter banner"
        echo '{"version": "8.0.0-fake"}'
        ;;
esac
"##;

/// Write the fake interpreter into `dir` and return its path.
pub fn fake_python(dir: &Path) -> PathBuf {
    let path = dir.join("fake-python");
    fs::write(&path, FAKE_PYTHON).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}
