#![allow(missing_docs)]

//! End-to-end CLI tests: output layout, exit codes, stdin, JSON format.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use tempfile::TempDir;

const CONSISTENT: &str = include_str!("../fixtures/snapshot/consistent.json");

const CLUSTER: &str = "b8c4421ac4bed7a177b3c365e2a97b08";
const VOLUME: &str = "7e2f4a6c8e0b2d4f6a8c0e2b4d6f8a0c";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot/consistent.json")
}

fn write_snapshot(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("export.json");
    fs::write(&path, contents).expect("write snapshot");
    path
}

/// The fixture with the sole volume id listed twice in its cluster.
fn damaged_doc() -> String {
    let mut doc: Value = serde_json::from_str(CONSISTENT).expect("fixture parses");
    doc["clusterentries"][CLUSTER]["Info"]["volumes"]
        .as_array_mut()
        .expect("volume list")
        .push(json!(VOLUME));
    doc.to_string()
}

#[test]
fn clean_snapshot_exits_zero_with_summary() {
    let output = cargo_bin_cmd!("ashlar-dbcheck")
        .arg(fixture_path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf8 stdout");
    assert!(stdout.contains("        Clusters:     1"), "got: {stdout}");
    assert!(stdout.contains("           Nodes:     3"), "got: {stdout}");
    assert!(stdout.contains("         Devices:     3"), "got: {stdout}");
    assert!(stdout.contains("          Bricks:     3"), "got: {stdout}");
    assert!(stdout.contains("         Volumes:     1"), "got: {stdout}");
    assert!(stdout.contains("    Blockvolumes:     0"), "got: {stdout}");
    assert!(stdout.contains("         Pending:     0"), "got: {stdout}");
}

#[test]
fn issues_exit_one_and_print_one_line_each() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_snapshot(&dir, &damaged_doc());

    let assert = cargo_bin_cmd!("ashlar-dbcheck").arg(&path).assert().code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let issue_line = format!("Cluster {CLUSTER}: duplicate ids in volume list: {VOLUME}");
    assert!(stdout.contains(&issue_line), "got: {stdout}");
}

#[test]
fn missing_file_exits_two() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("no-such-export.json");

    let assert = cargo_bin_cmd!("ashlar-dbcheck").arg(&path).assert().code(2);
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 stderr");
    assert!(stderr.contains("error:"), "got: {stderr}");
}

#[test]
fn unparseable_document_exits_two() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_snapshot(&dir, "{\"clusterentries\": ");

    let assert = cargo_bin_cmd!("ashlar-dbcheck").arg(&path).assert().code(2);
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 stderr");
    assert!(stderr.contains("malformed snapshot"), "got: {stderr}");
}

#[test]
fn dash_reads_the_snapshot_from_stdin() {
    cargo_bin_cmd!("ashlar-dbcheck")
        .arg("-")
        .write_stdin(CONSISTENT)
        .assert()
        .success();
}

#[test]
fn json_format_emits_the_full_report() {
    let output = cargo_bin_cmd!("ashlar-dbcheck")
        .args(["--format", "json"])
        .arg(fixture_path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(report["success"], json!(true));
    assert_eq!(report["summary"]["clusters"]["total"], json!(1));
    assert_eq!(report["summary"]["bricks"]["total"], json!(3));
    assert_eq!(report["issues"], json!([]));
}

#[test]
fn json_format_carries_issue_records() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_snapshot(&dir, &damaged_doc());

    let assert = cargo_bin_cmd!("ashlar-dbcheck")
        .args(["--format", "json"])
        .arg(&path)
        .assert()
        .code(1);
    let report: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json");
    assert_eq!(report["success"], json!(false));
    assert_eq!(report["tally"]["clusters"], json!(1));
    assert_eq!(report["issues"][0]["entity_type"], json!("cluster"));
    assert_eq!(report["issues"][0]["entity_id"], json!(CLUSTER));
    assert_eq!(
        report["issues"][0]["message"],
        json!("duplicate ids in volume list")
    );
}

#[test]
fn pending_counts_show_in_the_summary() {
    let mut doc: Value = serde_json::from_str(CONSISTENT).expect("fixture parses");
    let pid = "1b9e0d2c4f6a8b0d1f3e5c7b9a2d4f6a";
    doc["volumeentries"][VOLUME]["Pending"]["Id"] = json!(pid);
    doc["pendingoperations"][pid] = json!({
        "Id": pid,
        "Actions": [ { "Change": 2, "Id": VOLUME, "Delta": 0 } ]
    });
    let dir = TempDir::new().expect("tempdir");
    let path = write_snapshot(&dir, &doc.to_string());

    let output = cargo_bin_cmd!("ashlar-dbcheck")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf8 stdout");
    assert!(
        stdout.contains("         Volumes:     1  (1 pending)"),
        "got: {stdout}"
    );
    assert!(stdout.contains("         Pending:     1"), "got: {stdout}");
}
