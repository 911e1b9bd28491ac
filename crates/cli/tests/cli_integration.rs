use std::path::Path;
use std::process::{Command, Output};

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jira_agile() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jira-agile"));
    cmd.env_remove("JIRA_AGILE_TOKEN").env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(
        &path,
        format!(
            "default_profile: test\nprofiles:\n  test:\n    base_url: {base_url}\n    username: test@example.com\n    api_token: fake-token\n"
        ),
    )
    .unwrap();
    path
}

/// Runs the binary off the test runtime's worker so the mock server keeps serving.
async fn run(config: &Path, args: &[&str]) -> Output {
    let mut cmd = jira_agile();
    cmd.arg("--config").arg(config).args(args);
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute command"))
        .await
        .unwrap()
}

#[test]
fn test_cli_version() {
    let output = jira_agile().arg("--version").output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("jira-agile"));
    assert!(out.contains("0.1."));
}

#[test]
fn test_cli_help() {
    let output = jira_agile().arg("--help").output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Usage:"));
    assert!(out.contains("board"));
    assert!(out.contains("webhook"));
    assert!(out.contains("user"));
}

#[test]
fn test_board_help_lists_subcommands() {
    let output = jira_agile().args(["board", "--help"]).output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    for sub in ["list", "create", "delete", "config", "sprints", "epics", "backlog"] {
        assert!(out.contains(sub), "missing {sub} in board help");
    }
}

#[test]
fn test_webhook_create_requires_event() {
    let output = jira_agile()
        .args(["webhook", "create", "--name", "hook", "--url", "https://x.test"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--event"));
}

#[test]
fn test_missing_profile_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("absent.yaml");
    let output = jira_agile()
        .arg("--config")
        .arg(&config)
        .args(["user", "me"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No profile configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_board_list_renders_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board"))
        .and(query_param("boardType", "scrum"))
        .and(header(
            "authorization",
            "Basic dGVzdEBleGFtcGxlLmNvbTpmYWtlLXRva2Vu",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "maxResults": 50,
            "startAt": 0,
            "total": 1,
            "isLast": true,
            "values": [{"id": 84, "name": "DEV board", "type": "scrum"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let output = run(&config, &["--output", "json", "board", "list", "--type", "scrum"]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let rows: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(rows[0]["id"], 84);
    assert_eq!(rows[0]["name"], "DEV board");
    assert_eq!(rows[0]["type"], "scrum");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_board_list_says_so() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [],
            "total": 0,
            "isLast": true
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let output = run(&config, &["board", "list"]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("No boards returned"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sprint_ids_in_quiet_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/84/sprint"))
        .and(query_param("maxResults", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [
                {"id": 37, "name": "Sprint 1", "state": "closed"},
                {"id": 38, "name": "Sprint 2", "state": "active"}
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let output = run(&config, &["--output", "quiet", "board", "sprints", "84"]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "37\n38");

    let output = run(
        &config,
        &["--output", "quiet", "board", "sprints", "84", "--state", "active"],
    )
    .await;
    assert_eq!(stdout(&output).trim(), "38");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_force_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let output = run(&config, &["board", "delete", "84"]).await;

    assert!(output.status.success());
    assert!(stderr(&output).contains("--force"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_board_prints_suggestion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "errorMessages": ["Board does not exist"]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let output = run(&config, &["board", "get", "99"]).await;

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Failed to get board 99"));
    assert!(err.contains("identifier is correct"));
}
