use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn laminate() -> Command {
    Command::cargo_bin("laminate").unwrap()
}

#[test]
fn layers_lists_the_full_table() {
    laminate()
        .arg("layers")
        .assert()
        .success()
        .stdout(predicate::str::contains("config-modernization"))
        .stdout(predicate::str::contains("component-correctness"))
        .stdout(predicate::str::contains("test-quality"));
}

#[test]
fn layers_json_exposes_dependencies() {
    let output = laminate().args(["layers", "--json"]).output().unwrap();
    assert!(output.status.success());

    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[0]["dependencies"].as_array().unwrap().len(), 0);
    assert_eq!(
        rows[3]["dependencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(rows[3]["critical"], true);
}

#[test]
fn stdin_mode_prints_fixed_code() {
    let dir = TempDir::new().unwrap();
    laminate()
        .current_dir(dir.path())
        .args(["run", "--stdin", "--layers", "2"])
        .write_stdin("const a = &amp;b;\n")
        .assert()
        .success()
        .stdout("const a = &b;\n");
}

#[test]
fn stdin_json_mode_emits_a_report() {
    let dir = TempDir::new().unwrap();
    let output = laminate()
        .current_dir(dir.path())
        .args(["run", "--stdin", "--layers", "2", "--json"])
        .write_stdin("const a = &amp;b;\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["final_code"], "const a = &b;\n");
    assert_eq!(report["success"], true);
    // requesting layer 2 pulls in its dependency, layer 1
    assert_eq!(report["results"].as_array().unwrap().len(), 2);
}

#[test]
fn run_without_files_or_stdin_fails() {
    let dir = TempDir::new().unwrap();
    laminate()
        .current_dir(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input files"));
}

#[test]
fn unknown_layers_only_request_fails() {
    let dir = TempDir::new().unwrap();
    laminate()
        .current_dir(dir.path())
        .args(["run", "--stdin", "--layers", "9"])
        .write_stdin("const a = 1;\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid layers"));
}

#[test]
fn malformed_layer_token_fails() {
    let dir = TempDir::new().unwrap();
    laminate()
        .current_dir(dir.path())
        .args(["run", "--stdin", "--layers", "one,2"])
        .write_stdin("const a = 1;\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid layer id"));
}

#[test]
fn dry_run_reports_without_rewriting() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("widget.jsx");
    let original = "const label = &quot;Save&quot;;\n";
    std::fs::write(&file, original).unwrap();

    laminate()
        .current_dir(dir.path())
        .args(["run", "--dry-run", "widget.jsx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/1 files succeeded"));

    assert_eq!(std::fs::read_to_string(&file).unwrap(), original);
}

#[test]
fn run_rewrites_files_in_place() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("widget.jsx");
    std::fs::write(&file, "module.exports = Widget;\n").unwrap();

    laminate()
        .current_dir(dir.path())
        .args(["run", "widget.jsx"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "export default Widget;\n"
    );
}

#[test]
fn explicit_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    laminate()
        .current_dir(dir.path())
        .args(["run", "--stdin", "--config", "absent.toml"])
        .write_stdin("const a = 1;\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
