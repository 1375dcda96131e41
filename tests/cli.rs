//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_workflow_steps() {
    Command::cargo_bin("recycling-notes")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("confirm"))
        .stdout(predicate::str::contains("issue"));
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("recycling-notes")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(dir.path().join(".recycling-notes/config.toml").exists());
}

#[test]
fn test_disabled_feature_flag_hides_note_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[features]\nnotes = false\n",
    )
    .unwrap();

    Command::cargo_bin("recycling-notes")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", config_path.to_str().unwrap()])
        .args(["--token", "test-token"])
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_missing_scope_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("recycling-notes")
        .unwrap()
        .current_dir(dir.path())
        .args(["--token", "test-token"])
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("organisation"));
}
