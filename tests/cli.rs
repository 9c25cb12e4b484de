//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn specd(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("specd").unwrap();
    cmd.arg("--root").arg(root.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_create_and_list() {
    let root = TempDir::new().unwrap();

    specd(&root)
        .args(["create", "user-auth", "login system"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created specification 'user-auth'"));

    assert!(root.path().join("specs/user-auth/requirements.md").is_file());

    let output = specd(&root).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let specs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(specs[0]["feature_name"], "user-auth");
    assert_eq!(specs[0]["phase"], "REQUIREMENTS");
}

#[test]
fn test_list_empty() {
    let root = TempDir::new().unwrap();
    specd(&root)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No specifications found"));
}

#[test]
fn test_approve_and_phase() {
    let root = TempDir::new().unwrap();
    specd(&root)
        .args(["create", "user-auth", "login system"])
        .assert()
        .success();

    specd(&root)
        .args(["approve", "user-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REQUIREMENTS → 📐 DESIGN"));

    specd(&root)
        .args(["phase", "user-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DESIGN"));
}

#[test]
fn test_update_from_file_with_approval() {
    let root = TempDir::new().unwrap();
    specd(&root)
        .args(["create", "user-auth", "login system"])
        .assert()
        .success();
    specd(&root).args(["approve", "user-auth"]).assert().success();

    let design = root.path().join("design-draft.md");
    std::fs::write(&design, "# Design\n\n## Overview\n").unwrap();
    specd(&root)
        .args(["update", "user-auth", "design", "--approve", "--file"])
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("DESIGN → 📋 TASKS"))
        .stdout(predicate::str::contains("Generated starter tasks.md"));

    specd(&root)
        .args(["update", "user-auth", "tasks", "--stdin"])
        .write_stdin("- [ ] 1. Build login form\n- [ ] 2. Add logout\n")
        .assert()
        .success();

    specd(&root)
        .args(["read", "user-auth", "tasks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Implementation Plan"))
        .stdout(predicate::str::contains("- [ ] 2. Add logout"));
}

#[test]
fn test_task_next_and_mark() {
    let root = TempDir::new().unwrap();
    specd(&root)
        .args(["create", "user-auth", "login system"])
        .assert()
        .success();
    specd(&root).args(["approve", "user-auth"]).assert().success();
    specd(&root)
        .args(["update", "user-auth", "design", "--approve", "--stdin"])
        .write_stdin("# Design\n\n## Overview\n")
        .assert()
        .success();
    specd(&root)
        .args(["update", "user-auth", "tasks", "--stdin"])
        .write_stdin("- [ ] 1. Session store\n  - [ ] 1.1 Schema\n")
        .assert()
        .success();

    specd(&root)
        .args(["task", "next", "user-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task 1.1"));

    specd(&root)
        .args(["task", "mark", "user-auth", "1", "completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hint: complete sub-tasks 1.1 first"));

    specd(&root)
        .args(["task", "mark", "user-auth", "1.1", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 completed"));
}

#[test]
fn test_errors_exit_nonzero_with_hint() {
    let root = TempDir::new().unwrap();
    specd(&root)
        .args(["delete", "payments"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Hint:"));

    specd(&root)
        .args(["create", "User Auth", "idea"])
        .assert()
        .failure();
}

#[test]
fn test_delete() {
    let root = TempDir::new().unwrap();
    specd(&root)
        .args(["create", "user-auth", "login system"])
        .assert()
        .success();
    specd(&root)
        .args(["delete", "user-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spec.yaml"));
    assert!(!root.path().join("specs/user-auth").exists());
}
