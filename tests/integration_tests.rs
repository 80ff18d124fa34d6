//! Integration tests for the fieldtrack CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PIPE_HEADER: &str = "type,drawing,commodity_code,size,qty,line\n";

/// Helper to get a fieldtrack command
fn fieldtrack() -> Command {
    let mut cmd = Command::cargo_bin("fieldtrack").unwrap();
    cmd.env("FIELDTRACK_AUTHOR", "Test Author")
        .env_remove("RUST_LOG")
        .env_remove("FIELDTRACK_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fieldtrack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    tmp
}

/// Write a CSV into the project and import it
fn import_csv(tmp: &TempDir, name: &str, contents: &str) -> assert_cmd::assert::Assert {
    let path = tmp.path().join(name);
    fs::write(&path, contents).unwrap();
    fieldtrack()
        .current_dir(tmp.path())
        .args(["import", path.to_str().unwrap()])
        .assert()
}

/// Ids of listed components, in list order
fn list_ids(tmp: &TempDir) -> Vec<String> {
    let output = fieldtrack()
        .current_dir(tmp.path())
        .args(["list", "--format", "id"])
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn show_json(tmp: &TempDir, reference: &str) -> serde_json::Value {
    let output = fieldtrack()
        .current_dir(tmp.path())
        .args(["show", reference, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    fieldtrack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized fieldtrack project"));

    assert!(tmp.path().join(".fieldtrack").is_dir());
    assert!(tmp.path().join(".fieldtrack/config.yaml").is_file());
    assert!(tmp.path().join(".fieldtrack/templates.yaml").is_file());
    assert!(tmp.path().join("components").is_dir());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_test_project();
    fieldtrack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();
    fieldtrack()
        .current_dir(tmp.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a fieldtrack project"));
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_template_prints_header() {
    fieldtrack()
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("type,drawing,spool_id"))
        .stdout(predicate::str::contains("Threaded_Pipe"));
}

#[test]
fn test_threaded_pipe_scenario() {
    let tmp = setup_test_project();

    import_csv(
        &tmp,
        "first.csv",
        &format!("{}Threaded_Pipe,P-001,TP40,1,50,1\n", PIPE_HEADER),
    )
    .success()
    .stdout(predicate::str::contains("1 created"));

    let ids = list_ids(&tmp);
    assert_eq!(ids.len(), 1);

    fieldtrack()
        .current_dir(tmp.path())
        .args(["milestone", "set", "@1", "Fabricate_LF", "35"])
        .assert()
        .success()
        .stdout(predicate::str::contains("11%"));

    import_csv(
        &tmp,
        "second.csv",
        &format!("{}Threaded_Pipe,P-001,TP40,1\",50,2\n", PIPE_HEADER),
    )
    .success()
    .stdout(predicate::str::contains("1 merged"));

    let shown = show_json(&tmp, &ids[0]);
    assert_eq!(shown["percent_complete"], 6);
    assert_eq!(shown["attributes"]["total_linear_feet"], 100.0);
    assert_eq!(shown["current_milestones"]["Fabricate_LF"], 35.0);

    import_csv(
        &tmp,
        "third.csv",
        &format!("{}Threaded_Pipe,P-001,TP40,1,30,2\n", PIPE_HEADER),
    )
    .success()
    .stderr(predicate::str::contains("already recorded"));

    let shown = show_json(&tmp, &ids[0]);
    assert_eq!(shown["attributes"]["total_linear_feet"], 130.0);
    assert_eq!(
        shown["attributes"]["line_numbers"],
        serde_json::json!(["1", "2"])
    );
    assert_eq!(list_ids(&tmp).len(), 1);
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let tmp = setup_test_project();
    let path = tmp.path().join("takeoff.csv");
    fs::write(&path, format!("{}Pipe,P-001,CS,2,10,1\n", PIPE_HEADER)).unwrap();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["import", path.to_str().unwrap(), "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(list_ids(&tmp).is_empty());
}

#[test]
fn test_reimport_skips_instance_duplicates() {
    let tmp = setup_test_project();
    let csv = "type,drawing,commodity_code,size,qty\nValve,P-001,GV-150,2,2\n";

    import_csv(&tmp, "valves.csv", csv)
        .success()
        .stdout(predicate::str::contains("2 created"));
    import_csv(&tmp, "valves.csv", csv)
        .success()
        .stdout(predicate::str::contains("2 duplicate(s)"));

    fieldtrack()
        .current_dir(tmp.path())
        .args(["list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GV-150 2 (1 of 2)"))
        .stdout(predicate::str::contains("GV-150 2 (2 of 2)"));
}

#[test]
fn test_strict_import_fails_on_bad_rows() {
    let tmp = setup_test_project();
    let path = tmp.path().join("bad.csv");
    fs::write(
        &path,
        "type,drawing,spool_id\nSpool,P-001,SP-1\nWidget,P-001,X\n",
    )
    .unwrap();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["import", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 error(s)"));

    fieldtrack()
        .current_dir(tmp.path())
        .args(["import", path.to_str().unwrap(), "--strict"])
        .assert()
        .failure();
}

#[test]
fn test_import_missing_column_fails() {
    let tmp = setup_test_project();
    import_csv(&tmp, "bad.csv", "type,spool_id\nSpool,SP-1\n")
        .failure()
        .stderr(predicate::str::contains("drawing"));
}

// ============================================================================
// Milestones & locking
// ============================================================================

#[test]
fn test_stale_version_is_rejected() {
    let tmp = setup_test_project();
    import_csv(&tmp, "spool.csv", "type,drawing,spool_id\nSpool,P-001,SP-1\n").success();
    let id = list_ids(&tmp).remove(0);

    fieldtrack()
        .current_dir(tmp.path())
        .args(["milestone", "set", &id, "Receive", "true", "--expect-version", "1"])
        .assert()
        .success();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["milestone", "set", &id, "Erect", "true", "--expect-version", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("modified concurrently"));

    let shown = show_json(&tmp, &id);
    assert_eq!(shown["version"], 2);
    assert_eq!(shown["current_milestones"]["Erect"], false);
}

#[test]
fn test_unknown_milestone_rejected() {
    let tmp = setup_test_project();
    import_csv(&tmp, "spool.csv", "type,drawing,spool_id\nSpool,P-001,SP-1\n").success();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["milestone", "set", "@1", "Paint", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no milestone named"));
}

#[test]
fn test_legacy_milestone_name_canonicalized() {
    let tmp = setup_test_project();
    import_csv(
        &tmp,
        "weld.csv",
        "type,drawing,weld_number\nField_Weld,P-001,W-1\n",
    )
    .success();
    let id = list_ids(&tmp).remove(0);

    fieldtrack()
        .current_dir(tmp.path())
        .args(["milestone", "set", &id, "Weld Made", "yes"])
        .assert()
        .success();

    let shown = show_json(&tmp, &id);
    assert_eq!(shown["current_milestones"]["Weld Complete"], true);
    assert_eq!(shown["percent_complete"], 60);
}

#[test]
fn test_assign_and_retire() {
    let tmp = setup_test_project();
    import_csv(
        &tmp,
        "spools.csv",
        "type,drawing,spool_id\nSpool,P-001,SP-1\nSpool,P-001,SP-2\n",
    )
    .success();
    let ids = list_ids(&tmp);

    fieldtrack()
        .current_dir(tmp.path())
        .args(["assign", &ids[0], "--area", "A1", "--test-package", "TP-1"])
        .assert()
        .success();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["list", "--area", "a1", "--count"])
        .assert()
        .success()
        .stdout("1\n");

    fieldtrack()
        .current_dir(tmp.path())
        .args(["retire", &ids[1]])
        .assert()
        .success();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["list", "--count"])
        .assert()
        .success()
        .stdout("1\n");

    fieldtrack()
        .current_dir(tmp.path())
        .args(["list", "--all", "--count"])
        .assert()
        .success()
        .stdout("2\n");
}

// ============================================================================
// Templates & recompute
// ============================================================================

#[test]
fn test_template_change_requires_recompute() {
    let tmp = setup_test_project();
    import_csv(
        &tmp,
        "pipe.csv",
        &format!("{}Threaded_Pipe,P-001,TP40,1,100,1\n", PIPE_HEADER),
    )
    .success();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["milestone", "set", "@1", "Fabricate_LF", "35"])
        .assert()
        .success();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["recompute", "--check"])
        .assert()
        .success();

    fs::write(
        tmp.path().join(".fieldtrack/templates.yaml"),
        r#"
templates:
  - id: threaded_pipe_v2
    component_type: Threaded_Pipe
    revision: 2
    milestones:
      - { name: Fabricate_LF, weight: 50, kind: quantity }
      - { name: Install_LF, weight: 50, kind: quantity }
"#,
    )
    .unwrap();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["recompute", "--check"])
        .assert()
        .failure();

    fieldtrack()
        .current_dir(tmp.path())
        .arg("recompute")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 updated"));

    let id = list_ids(&tmp).remove(0);
    assert_eq!(show_json(&tmp, &id)["percent_complete"], 18);

    fieldtrack()
        .current_dir(tmp.path())
        .args(["recompute", "--check"])
        .assert()
        .success();
}

#[test]
fn test_template_check_and_show() {
    let tmp = setup_test_project();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["template", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 template(s) valid"));

    fieldtrack()
        .current_dir(tmp.path())
        .args(["template", "show", "field_weld"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weld Made → Weld Complete"));
}

#[test]
fn test_invalid_template_file_rejected() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join(".fieldtrack/templates.yaml"),
        "templates:\n  - id: valve\n    component_type: Valve\n    milestones:\n      - { name: Install, weight: 40 }\n",
    )
    .unwrap();

    fieldtrack()
        .current_dir(tmp.path())
        .args(["template", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid progress template"));
}

// ============================================================================
// Status
// ============================================================================

#[test]
fn test_status_by_type_json() {
    let tmp = setup_test_project();
    import_csv(
        &tmp,
        "mixed.csv",
        "type,drawing,spool_id,commodity_code,size,qty,line\n\
         Spool,P-001,SP-1,,,,1\n\
         Pipe,P-001,,CS,2,40,2\n",
    )
    .success();

    let output = fieldtrack()
        .current_dir(tmp.path())
        .args(["status", "--by", "type", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["group"], "Pipe");
    assert_eq!(rows[0]["linear_feet"], 40.0);
    assert_eq!(rows[1]["group"], "Spool");
}

#[test]
fn test_completions_generate() {
    fieldtrack()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldtrack"));
}
