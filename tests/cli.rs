use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const MODELS: &str = r#"
/// @document
pub struct Listing {
    pub id: String,
    pub price: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// @document
pub enum Status { Open, Closed }
"#;

fn cmd() -> Command {
    cargo_bin_cmd!("docmap")
}

fn workspace() -> TempDir {
    let tmp = TempDir::new().expect("create temp dir");
    fs::write(tmp.path().join("models.rs"), MODELS).expect("write models");
    tmp
}

#[test]
fn generate_prints_mapper_and_reports_rejected_records() {
    let tmp = workspace();
    cmd()
        .args(["generate", "-i"])
        .arg(tmp.path().join("models.rs"))
        .assert()
        .failure()
        .stdout(contains("pub fn from_listing(doc: &Document) -> Result<Listing, DocumentShapeError> {"))
        .stderr(contains("DM0100"));
}

#[test]
fn generate_writes_files_and_check_detects_drift() {
    let tmp = workspace();
    let out = tmp.path().join("generated");
    let models = tmp.path().join("models.rs");
    let run = |check: bool| {
        let mut c = cmd();
        c.args(["generate", "--record", "Listing", "-i"]).arg(&models).arg("--out-dir").arg(&out);
        if check {
            c.arg("--check");
        }
        c.assert()
    };

    run(false).success();
    let written = fs::read_to_string(out.join("listing_mapper.rs")).expect("mapper written");
    assert!(written.starts_with("// @generated by docmap from `Listing`."));

    run(true).success();

    fs::write(out.join("listing_mapper.rs"), "stale").unwrap();
    run(true).failure().stderr(contains("out of date"));
    assert_eq!(fs::read_to_string(out.join("listing_mapper.rs")).unwrap(), "stale");
}

#[test]
fn plan_emits_strategies_as_json() {
    let tmp = workspace();
    let output = cmd()
        .args(["plan", "--record", "Listing", "-i"])
        .arg(tmp.path().join("models.rs"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let plans: Value = serde_json::from_slice(&output).expect("valid json output");
    assert_eq!(plans[0]["record"], "Listing");
    assert_eq!(plans[0]["fields"][0]["Mapped"]["strategy"]["StrictScalar"], "String");
    assert_eq!(plans[0]["fields"][2]["Mapped"]["strategy"]["DefaultedList"], "String");
}

#[test]
fn read_applies_defaults_and_strictness() {
    let tmp = workspace();
    let models = tmp.path().join("models.rs");
    fs::write(tmp.path().join("ok.json"), r#"{"data": {"id": "123"}}"#).unwrap();
    fs::write(tmp.path().join("bad.json"), r#"{"amount": "oops"}"#).unwrap();

    let output = cmd()
        .args(["read", "--record", "Listing", "--json-pointer", "/data", "-i"])
        .arg(&models)
        .arg("--document")
        .arg(tmp.path().join("ok.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let record: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(record, serde_json::json!({"id": "123", "price": 0.0, "tags": []}));

    cmd()
        .args(["read", "--record", "Listing", "-i"])
        .arg(&models)
        .arg("--document")
        .arg(tmp.path().join("bad.json"))
        .assert()
        .failure()
        .stderr(contains("field `id`"));
}

#[test]
fn json_manifest_input_is_accepted() {
    let tmp = TempDir::new().unwrap();
    let manifest = tmp.path().join("schema.json");
    fs::write(
        &manifest,
        r#"{"records": [{"record": "Ping", "fields": [{"name": "at", "type": {"Scalar": "Int"}}]}]}"#,
    )
    .unwrap();
    cmd()
        .args(["generate", "--no-header", "--runtime-path", "crate::rt", "-i"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(contains("use crate::rt::{self as runtime, Document, DocumentShapeError};"))
        .stdout(contains(r#"at: runtime::read_strict::<i64>(doc, "at")?,"#));
}

#[test]
fn check_reports_missing_files_as_stale_and_unreadable_ones_as_errors() {
    let tmp = workspace();
    let out = tmp.path().join("generated");
    let check = || {
        cmd()
            .args(["generate", "--check", "--record", "Listing", "-i"])
            .arg(tmp.path().join("models.rs"))
            .arg("--out-dir")
            .arg(&out)
            .assert()
    };

    check().failure().stderr(contains("out of date"));

    // A directory where the mapper should be cannot be read as a file.
    fs::create_dir_all(out.join("listing_mapper.rs")).unwrap();
    check()
        .failure()
        .stderr(contains("failed to read"))
        .stderr(contains("out of date").not());
}
