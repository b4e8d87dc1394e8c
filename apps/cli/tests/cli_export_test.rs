//! Integration tests for the `starwatch export` command.
//!
//! Successful runs use a shell script in place of the Python interpreter.

mod common;

use common::{engine_model, fake_python, starwatch};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_export_missing_weights_points_at_train() {
    let temp_dir = TempDir::new().unwrap();

    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("export")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing prerequisite artifact"))
        .stderr(predicate::str::contains("best.pt"))
        .stderr(predicate::str::contains("starwatch train"));

    assert!(!engine_model(temp_dir.path()).exists());
    assert!(!temp_dir.path().join("java-engine").exists());
}

#[test]
fn test_export_explicit_missing_weights() {
    let temp_dir = TempDir::new().unwrap();

    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .args(["export", "--weights", "nowhere/model.pt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere/model.pt"));
}

#[test]
fn test_export_rejects_zero_opset() {
    let temp_dir = TempDir::new().unwrap();
    let weights = temp_dir.path().join("best.pt");
    fs::write(&weights, b"ckpt").unwrap();

    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("export")
        .arg("--weights")
        .arg(&weights)
        .args(["--opset", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("opset"));

    assert!(!engine_model(temp_dir.path()).exists());
}

#[test]
fn test_export_unusable_interpreter_leaves_no_output() {
    let temp_dir = TempDir::new().unwrap();
    let weights = temp_dir.path().join("best.pt");
    fs::write(&weights, b"ckpt").unwrap();

    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("--python")
        .arg(temp_dir.path().join("no-such-python"))
        .arg("export")
        .arg("--weights")
        .arg(&weights)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to start"));

    assert!(!engine_model(temp_dir.path()).exists());
    assert_eq!(fs::read(&weights).unwrap(), b"ckpt");
}

#[test]
fn test_export_weights_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("starwatch.toml"), "[export]\nweights = \"models/from-config.pt\"\n").unwrap();

    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("export")
        .assert()
        .failure()
        .stderr(predicate::str::contains("from-config.pt"));

    // CLI flag wins over the config file.
    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .args(["export", "--weights", "flag.pt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("flag.pt"))
        .stderr(predicate::str::contains("from-config.pt").not());
}

#[test]
fn test_export_root_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");
    fs::create_dir_all(&project).unwrap();

    starwatch(&temp_dir)
        .env("STARWATCH_ROOT", &project)
        .arg("export")
        .assert()
        .failure()
        .stderr(predicate::str::contains("project"))
        .stderr(predicate::str::contains("python-ml"));
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = TempDir::new().unwrap();

    starwatch(&temp_dir)
        .args(["--config", "absent.toml", "export"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.toml"));
}

/// Place trained weights at the default checkpoint path under `root`.
fn write_default_weights(root: &Path) -> std::path::PathBuf {
    let weights = root.join("python-ml/weights/best.pt");
    fs::create_dir_all(weights.parent().unwrap()).unwrap();
    fs::write(&weights, b"trained weights").unwrap();
    weights
}

#[cfg(unix)]
#[test]
fn test_export_success_writes_engine_model_and_discards_intermediate() {
    let temp_dir = TempDir::new().unwrap();
    let weights = write_default_weights(temp_dir.path());
    let python = fake_python(temp_dir.path());

    starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("--python")
        .arg(&python)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("ONNX export complete"))
        .stdout(predicate::str::contains("starwatchx_yolov8.onnx"));

    assert_eq!(fs::read(engine_model(temp_dir.path())).unwrap(), b"onnx graph");
    assert!(!weights.with_extension("onnx").exists());
    assert_eq!(fs::read(&weights).unwrap(), b"trained weights");
}

#[cfg(unix)]
#[test]
fn test_export_keep_intermediate_and_json_report() {
    let temp_dir = TempDir::new().unwrap();
    let weights = write_default_weights(temp_dir.path());
    let python = fake_python(temp_dir.path());

    let output = starwatch(&temp_dir)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("--python")
        .arg(&python)
        .args(["export", "--keep-intermediate", "--opset", "13", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let intermediate = weights.with_extension("onnx");
    assert_eq!(report["intermediate"], intermediate.display().to_string());
    assert_eq!(report["graph"]["path"], engine_model(temp_dir.path()).display().to_string());
    assert_eq!(report["params"]["opset"], 13);
    assert!(report["trained_imgsz"].is_null());
    assert!(intermediate.is_file());
}
