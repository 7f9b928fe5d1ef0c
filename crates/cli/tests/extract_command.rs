use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_file(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

const SCHEMA: &str = r#"{
  "required": {
    "string": {"code": {"maxLength": 2}},
    "number": {"num": {"greaterOrEqualTo": "num2"}, "num2": {}}
  }
}"#;

#[test]
fn extract_drops_undeclared_keys() {
    let tmp = tempdir().unwrap();
    let schema = tmp.path().join("schema.json");
    let data = tmp.path().join("data.json");
    write_file(&schema, SCHEMA);
    write_file(&data, r#"{"code": "abc", "num": 1, "num2": 2, "junk": true}"#);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cval"));
    cmd.env("XDG_CONFIG_HOME", tmp.path());
    cmd.arg("extract").arg(&schema).arg(&data);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"code\": \"abc\""))
        .stdout(predicate::str::contains("junk").not());
}

#[test]
fn validate_reports_constraint_violation() {
    let tmp = tempdir().unwrap();
    let schema = tmp.path().join("schema.json");
    let data = tmp.path().join("data.json");
    write_file(&schema, SCHEMA);
    write_file(&data, r#"{"code": "abc", "num": 10, "num2": 2}"#);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cval"));
    cmd.env("XDG_CONFIG_HOME", tmp.path());
    cmd.arg("extract").arg(&schema).arg(&data).arg("--validate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("\"maxLength\""))
        .stderr(predicate::str::contains("\"abc\""));
}

#[test]
fn validate_reports_cross_field_violation() {
    let tmp = tempdir().unwrap();
    let schema = tmp.path().join("schema.json");
    let data = tmp.path().join("data.yml");
    write_file(&schema, SCHEMA);
    write_file(&data, "code: ab\nnum: 3\nnum2: 10\n");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cval"));
    cmd.env("XDG_CONFIG_HOME", tmp.path());
    cmd.arg("extract").arg(&schema).arg(&data).arg("--validate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Fields for validation: num,num2"));
}

#[test]
fn missing_required_field_fails() {
    let tmp = tempdir().unwrap();
    let schema = tmp.path().join("schema.json");
    let data = tmp.path().join("data.json");
    write_file(&schema, SCHEMA);
    write_file(&data, r#"{"num": 3, "num2": 1}"#);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cval"));
    cmd.env("XDG_CONFIG_HOME", tmp.path());
    cmd.arg("extract").arg(&schema).arg(&data);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("is required and should be present"));
}
