use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_uploader_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("naukri-uploader")
}

#[test]
fn test_setup_command_help() {
    let mut cmd = Command::new(get_uploader_bin());
    cmd.arg("setup").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Log in once"))
        .stdout(predicate::str::contains("--auto"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--storage"));
}

#[test]
fn test_setup_timeout_requires_auto() {
    let mut cmd = Command::new(get_uploader_bin());
    cmd.arg("setup").arg("--timeout").arg("30");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--auto"));
}
