use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn get_uploader_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("naukri-uploader")
}

/// Upload command with notifications and credential sources switched off
fn quiet_upload(storage: &TempDir) -> Command {
    let mut cmd = Command::new(get_uploader_bin());
    cmd.arg("upload")
        .arg("--storage")
        .arg(storage.path().join("storage_state.json"))
        .arg("--no-desktop-notify")
        .arg("--mailer")
        .arg("none")
        .env_remove("NAUKRI_USERNAME")
        .env_remove("NAUKRI_PASSWORD")
        .env_remove("NAUKRI_NOTIFY_TO");
    cmd
}

#[test]
fn test_upload_command_help() {
    let mut cmd = Command::new(get_uploader_bin());
    cmd.arg("upload").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--resume-path"))
        .stdout(predicate::str::contains("--storage"))
        .stdout(predicate::str::contains("--headed"))
        .stdout(predicate::str::contains("--background"))
        .stdout(predicate::str::contains("--engine"))
        .stdout(predicate::str::contains("--password-env"))
        .stdout(predicate::str::contains("--email-on-success"))
        .stdout(predicate::str::contains("--no-desktop-notify"));
}

#[test]
fn test_upload_missing_resume_exits_with_2() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-resume.pdf");

    let mut cmd = quiet_upload(&dir);
    cmd.arg("--resume-path").arg(&missing);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("resume unavailable"));
}

#[test]
fn test_upload_folder_without_resumes_exits_with_2() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("resume");
    std::fs::create_dir(&folder).unwrap();
    std::fs::write(folder.join("notes.txt"), "not a resume").unwrap();

    let mut cmd = quiet_upload(&dir);
    cmd.arg("--resume-path").arg(&folder);

    cmd.assert().code(2);
}

#[test]
fn test_upload_rejects_unknown_engine() {
    let mut cmd = Command::new(get_uploader_bin());
    cmd.arg("upload").arg("--engine").arg("webkit");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_upload_missing_browser_binary_exits_with_4() {
    let dir = TempDir::new().unwrap();
    let resume = dir.path().join("resume.pdf");
    std::fs::write(&resume, b"%PDF-1.4").unwrap();

    let mut cmd = quiet_upload(&dir);
    cmd.arg("--resume-path")
        .arg(&resume)
        .arg("--engine")
        .arg("chrome")
        .arg("--chrome-path")
        .arg(dir.path().join("no-such-browser"));

    cmd.assert()
        .code(4)
        .stdout(predicate::str::contains("Resume:"))
        .stderr(predicate::str::contains("browser unavailable"));
}
