/// CLI binary integration tests using assert_cmd
///
/// These tests invoke the actual binary and verify command-line behavior
mod common;

use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn vta(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vta-chat"));
    cmd.env("VTA_DATA_DIR", data_dir)
        .env("VTA_SERVER_URL", "http://127.0.0.1:9")
        .env("VTA_TIMEOUT_SECS", "2")
        .env_remove("VTA_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vta-chat"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Virtual Technical Assistant"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vta-chat"));
    cmd.arg("--version").assert().success().stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vta-chat"));
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_cli_ask_requires_query() {
    let temp = tempfile::TempDir::new().unwrap();
    vta(temp.path()).arg("ask").assert().failure();
}

#[test]
fn test_cli_status_logged_out() {
    let temp = tempfile::TempDir::new().unwrap();
    vta(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("VTA Chat Status"))
        .stdout(predicate::str::contains("Server: http://127.0.0.1:9"))
        .stdout(predicate::str::contains("Chat: logged out"))
        .stdout(predicate::str::contains("storage.json"));
}

#[test]
fn test_cli_status_reads_persisted_tokens() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::write(temp.path().join("storage.json"), r#"{"sessionId":"tok","adminToken":"adm"}"#)
        .unwrap();

    vta(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chat: logged in"))
        .stdout(predicate::str::contains("Admin: logged in"));
}

#[test]
fn test_cli_ask_logged_out_prompts_for_login() {
    let temp = tempfile::TempDir::new().unwrap();
    vta(temp.path())
        .args(["ask", "How", "do", "I", "change", "the", "oil?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please log in or register to use the chatbot."));
}

#[test]
fn test_cli_sessions_logged_out_prompts_for_login() {
    let temp = tempfile::TempDir::new().unwrap();
    vta(temp.path())
        .arg("sessions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please log in"));
}

#[test]
fn test_cli_logout_removes_token() {
    let temp = tempfile::TempDir::new().unwrap();
    let storage = temp.path().join("storage.json");
    std::fs::write(&storage, r#"{"sessionId":"tok","adminToken":"adm"}"#).unwrap();

    vta(temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let contents = std::fs::read_to_string(&storage).unwrap();
    assert!(!contents.contains("sessionId"));
    assert!(contents.contains("adminToken"));
}

#[test]
fn test_cli_admin_upload_rejects_non_pdf() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::write(temp.path().join("storage.json"), r#"{"adminToken":"adm"}"#).unwrap();
    let notes = temp.path().join("notes.txt");
    std::fs::write(&notes, "plain text").unwrap();

    vta(temp.path())
        .args(["admin", "upload"])
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only PDF files are accepted."));
}

#[test]
fn test_cli_admin_list_requires_admin_login() {
    let temp = tempfile::TempDir::new().unwrap();
    vta(temp.path())
        .args(["admin", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin"));
}

#[test]
fn test_cli_login_unreachable_server_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    vta(temp.path())
        .args(["login", "tech@example.com", "--password", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to authenticate"));

    assert!(!std::fs::read_to_string(temp.path().join("storage.json"))
        .unwrap_or_default()
        .contains("sessionId"));
}

#[test]
fn test_cli_ask_backend_failure_prints_apology_and_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::write(temp.path().join("storage.json"), r#"{"sessionId":"tok"}"#).unwrap();
    let server = common::CannedServer::start(vec![
        (200, r#"{"history":[]}"#),
        (500, r#"{"detail":"index offline"}"#),
    ]);

    vta(temp.path())
        .env("VTA_SERVER_URL", server.url())
        .args(["ask", "--session", "t1", "Why", "is", "the", "light", "on?"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("You: Why is the light on?"))
        .stdout(predicate::str::contains(
            "VTA: Sorry, I encountered an error while processing your request.",
        ))
        .stderr(predicate::str::contains("Failed to get an answer from the assistant."));

    let requests = server.finish();
    assert_eq!(requests.len(), 2);
}
