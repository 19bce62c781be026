// End-to-end tests for hook mode and the subcommands.
//
// These tests invoke the `bash-scanner` binary as a subprocess, with a
// PreToolUse payload on stdin for hook mode, and verify stdout JSON, stderr,
// and exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a PreToolUse hook payload for a Bash command.
fn bash_payload(command: &str, cwd: &str) -> String {
    json!({
        "hook_event_name": "PreToolUse",
        "session_id": "test-session-001",
        "transcript_path": "/tmp/transcript.jsonl",
        "cwd": cwd,
        "tool_name": "Bash",
        "tool_input": { "command": command },
        "tool_use_id": "toolu_test_001"
    })
    .to_string()
}

/// A binary isolated from the user's own config files.
fn bash_scanner(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("bash-scanner");
    cmd.env("HOME", home.path())
        .env_remove("BASH_SCANNER_CONFIG")
        .env_remove("BASH_SCANNER_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is valid JSON")
}

fn run_hook(home: &TempDir, command: &str, cwd: &str) -> Value {
    let output = bash_scanner(home)
        .write_stdin(bash_payload(command, cwd))
        .output()
        .expect("run binary");
    assert!(output.status.success(), "hook exited with {}", output.status);
    stdout_json(&output)
}

// ---------------------------------------------------------------------------
// Hook protocol
// ---------------------------------------------------------------------------

#[test]
fn hook_allows_write_to_tmp() {
    let home = TempDir::new().unwrap();
    let response = run_hook(&home, "echo hello > /tmp/out.txt", "/tmp");
    assert_eq!(
        response,
        json!({
            "continue": true,
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "allow"
            }
        })
    );
}

#[test]
fn hook_denies_system_delete_with_reason() {
    let home = TempDir::new().unwrap();
    let response = run_hook(&home, "rm -rf /etc/config", "/tmp");
    assert_eq!(response["continue"], true);
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "deny");
    assert_eq!(
        response["hookSpecificOutput"]["reason"],
        "Destructive delete targeting: /etc/config (System directory: /etc/)"
    );
}

#[test]
fn hook_denies_unparseable_command() {
    let home = TempDir::new().unwrap();
    let response = run_hook(&home, "echo 'unterminated", "/tmp");
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "deny");
    assert_eq!(
        response["hookSpecificOutput"]["reason"],
        "Failed to parse bash command"
    );
}

#[test]
fn hook_denies_deeply_nested_command() {
    let home = TempDir::new().unwrap();
    let command = format!("{}ls{}", "(".repeat(5000), ")".repeat(5000));
    let response = run_hook(&home, &command, "/tmp");
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "deny");
    assert_eq!(
        response["hookSpecificOutput"]["reason"],
        "Failed to parse bash command"
    );
}

#[test]
fn hook_passes_through_non_bash_tools() {
    let home = TempDir::new().unwrap();
    let payload = json!({
        "hook_event_name": "PreToolUse",
        "session_id": "test-session-001",
        "cwd": "/tmp",
        "tool_name": "Read",
        "tool_input": { "file_path": "/etc/passwd" }
    });
    bash_scanner(&home)
        .write_stdin(payload.to_string())
        .assert()
        .success()
        .stdout("{\"continue\":true}\n");
}

#[test]
fn hook_rejects_invalid_json() {
    let home = TempDir::new().unwrap();
    bash_scanner(&home)
        .write_stdin("not json")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn hook_rejects_bash_call_without_command() {
    let home = TempDir::new().unwrap();
    let payload = json!({ "tool_name": "Bash", "tool_input": {} });
    bash_scanner(&home)
        .write_stdin(payload.to_string())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing tool_input.command"));
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

#[test]
fn config_flag_adds_safe_paths() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("scanner.yaml");
    std::fs::write(&config, "safe_paths:\n  - /opt/build/*\n").unwrap();

    let output = bash_scanner(&home)
        .arg("--config")
        .arg(&config)
        .write_stdin(bash_payload("rm -rf /opt/build/out", "/tmp"))
        .output()
        .unwrap();
    let response = stdout_json(&output);
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "allow");

    // Without the config the same command is outside every safe location.
    let response = run_hook(&home, "rm -rf /opt/build/out", "/tmp");
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "deny");
}

#[test]
fn config_env_var_whitelists_commands() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("scanner.yaml");
    std::fs::write(&config, "whitelisted_commands:\n  - curl\n").unwrap();

    let output = bash_scanner(&home)
        .env("BASH_SCANNER_CONFIG", &config)
        .write_stdin(bash_payload("curl https://example.com", "/tmp"))
        .output()
        .unwrap();
    let response = stdout_json(&output);
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "allow");
}

#[test]
fn project_config_is_discovered_from_cwd() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join(".bash-scanner.yaml"),
        "whitelisted_commands: [wget]\n",
    )
    .unwrap();

    let response = run_hook(
        &home,
        "wget https://example.com/file",
        project.path().to_str().unwrap(),
    );
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "allow");
}

#[test]
fn missing_config_override_is_an_error() {
    let home = TempDir::new().unwrap();
    bash_scanner(&home)
        .args(["--config", "/nonexistent/scanner.yaml"])
        .write_stdin(bash_payload("ls", "/tmp"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read /nonexistent/scanner.yaml"));
}

#[test]
fn invalid_config_yaml_is_reported() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("scanner.yaml");
    std::fs::write(&config, "safe_paths: [unclosed\n").unwrap();

    bash_scanner(&home)
        .arg("--config")
        .arg(&config)
        .args(["scan", "ls"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid YAML"));
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

#[test]
fn scan_json_reports_violations() {
    let home = TempDir::new().unwrap();
    let output = bash_scanner(&home)
        .args(["--json", "--cwd", "/tmp", "scan", "curl https://example.com | jq ."])
        .output()
        .unwrap();
    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["allowed"], false);
    assert_eq!(result["violations"][0]["command"], "curl");
    assert_eq!(result["safe_operations"][0], "jq (safe pipe)");
}

#[test]
fn scan_json_operation_field_names() {
    let home = TempDir::new().unwrap();
    let output = bash_scanner(&home)
        .args(["--json", "--cwd", "/tmp", "scan", "rm -rf /etc/config"])
        .output()
        .unwrap();
    let result = stdout_json(&output);
    assert_eq!(
        result["operations"],
        json!([{
            "Path": "/etc/config",
            "Operation": "delete",
            "Command": "rm",
            "Line": 1,
            "HasGlob": false,
            "HasVar": false
        }])
    );
}

#[test]
fn scan_text_prints_verdict() {
    let home = TempDir::new().unwrap();
    bash_scanner(&home)
        .env("NO_COLOR", "1")
        .args(["--cwd", "/tmp", "scan", "ls -la"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("allowed"));
}

#[test]
fn analyze_json_lists_operations() {
    let home = TempDir::new().unwrap();
    let output = bash_scanner(&home)
        .args(["--json", "analyze", "touch a.txt && rm -f b.txt"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["Operations"][0]["Path"], "a.txt");
    assert_eq!(result["Operations"][0]["Operation"], "create");
    assert_eq!(result["Operations"][1]["Path"], "b.txt");
    assert_eq!(result["Operations"][1]["Operation"], "delete");
    assert_eq!(result["Commands"], json!(["touch a.txt", "rm -f b.txt"]));
}

#[test]
fn analyze_reports_parse_errors() {
    let home = TempDir::new().unwrap();
    bash_scanner(&home)
        .args(["analyze", "echo 'unterminated"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("bash_scanner::parse"));
}

#[test]
fn classify_picks_highest_priority_category() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let output = bash_scanner(&home)
        .arg("--json")
        .arg("--cwd")
        .arg(project.path())
        .args(["classify", "cd app && npm install"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({ "category": "install", "priority": 100 })
    );
}

#[test]
fn parse_prints_ast() {
    let home = TempDir::new().unwrap();
    bash_scanner(&home)
        .args(["parse", "echo hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("echo"));
}
