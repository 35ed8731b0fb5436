use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vocr() -> Command {
    Command::cargo_bin("vocr").unwrap()
}

/// Config file whose language no Tesseract install can satisfy.
fn unusable_engine_config(dir: &TempDir) -> String {
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "ocr": { "language": "klingon", "tesseract_path": "/nonexistent/tesseract" } }"#,
    )
    .unwrap();
    path.display().to_string()
}

#[test]
fn test_help_lists_commands() {
    vocr()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("engine"));
}

#[test]
fn test_config_init_then_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    vocr()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    assert!(path.exists());

    vocr()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "extraction.min_voucher_digits"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{}").unwrap();

    vocr()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_set_updates_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    vocr()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "extraction.min_voucher_digits", "10"])
        .assert()
        .success();

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"min_voucher_digits\": 10"));

    vocr()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn test_engine_status_reports_remediation() {
    let dir = TempDir::new().unwrap();
    let config = unusable_engine_config(&dir);

    vocr()
        .args(["--config", config.as_str(), "engine", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported language 'klingon'"))
        .stderr(predicate::str::contains("tesseract-ocr-por"));
}

#[test]
fn test_process_missing_file() {
    vocr()
        .args(["process", "/nonexistent/vale.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_without_engine_extracts_nothing() {
    let dir = TempDir::new().unwrap();
    let config = unusable_engine_config(&dir);
    let image = dir.path().join("vale.png");
    fs::write(&image, b"\x89PNG\r\n\x1a\n").unwrap();

    vocr()
        .args(["--config", config.as_str(), "process"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tesseract OCR is not configured correctly"))
        .stdout(predicate::str::contains("Número do Vale").not());
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.jpg").display().to_string();

    vocr()
        .args(["batch", pattern.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching image files"));
}

#[test]
fn test_min_digits_out_of_range_is_rejected() {
    vocr()
        .args(["batch", "x.jpg", "--min-digits", "3"])
        .assert()
        .failure();
}
