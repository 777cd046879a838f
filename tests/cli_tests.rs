// deck_core/tests/cli_tests.rs
// Smoke tests for the deck_server binary's argument surface.

use assert_cmd::Command;

#[test]
fn test_help_lists_configuration_flags() {
    let mut cmd = Command::cargo_bin("deck_server").expect("deck_server binary must be built");
    let assert = cmd.arg("--help").assert().success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(output.contains("--port"));
    assert!(output.contains("--data-file"));
    assert!(output.contains("--tls-cert"));
    assert!(output.contains("--tls-key"));
}

#[test]
fn test_rejects_malformed_port() {
    let mut cmd = Command::cargo_bin("deck_server").expect("deck_server binary must be built");
    cmd.arg("--port").arg("not-a-port").assert().failure();
}
