//! End-to-end CLI test: writes a small fixture directory of near-duplicate
//! Python files to a tempdir, runs the `structsim` binary against it, and
//! checks that both the human-readable summary and the `--json` output
//! surface the expected suspicious pair.

use std::process::Command;
use tempfile::tempdir;

fn structsim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_structsim"))
}

#[test]
fn analyze_flags_a_renamed_duplicate_pair() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("alice.py"),
        "def add(a, b):\n    total = a + b\n    return total\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("bob.py"),
        "def sum_values(x, y):\n    result = x + y\n    return result\n",
    )
    .unwrap();

    let output = structsim()
        .arg("analyze")
        .arg(dir.path())
        .arg("--no-save")
        .output()
        .expect("failed to run structsim analyze");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SUSPICIOUS PAIRS"));
    assert!(stdout.contains("FLAGGED"));
}

#[test]
fn analyze_json_round_trips_through_serde() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "def f(x):\n    return x\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "def g(y):\n    return y\n").unwrap();

    let output = structsim()
        .arg("analyze")
        .arg(dir.path())
        .arg("--json")
        .arg("--no-save")
        .output()
        .expect("failed to run structsim analyze --json");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["files"].as_array().unwrap().len(), 2);
    assert!(value["analysis_id"].is_string());
}

#[test]
fn analyze_on_empty_directory_reports_no_files_without_error() {
    let dir = tempdir().unwrap();
    let output = structsim()
        .arg("analyze")
        .arg(dir.path())
        .output()
        .expect("failed to run structsim analyze on empty dir");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No recognised source files found"));
}

#[test]
fn compare_reports_per_layer_breakdown() {
    let dir = tempdir().unwrap();
    let file1 = dir.path().join("a.py");
    let file2 = dir.path().join("b.py");
    std::fs::write(&file1, "def add(a, b):\n    return a + b\n").unwrap();
    std::fs::write(&file2, "def plus(x, y):\n    return x + y\n").unwrap();

    let output = structsim()
        .arg("compare")
        .arg(&file1)
        .arg(&file2)
        .output()
        .expect("failed to run structsim compare");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AST score"));
    assert!(stdout.contains("Final score"));
}
