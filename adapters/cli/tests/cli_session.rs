use std::{
    io::Write,
    process::{Command, Output, Stdio},
};

fn run_session(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_block-picker"))
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch block-picker");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write commands");

    child.wait_with_output().expect("block-picker did not exit")
}

#[test]
fn text_session_replies_to_commands() {
    let output = run_session(&["--seed", "7"], "score\nget_map\nmove sideways\nquit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("Score: 0"));
    assert!(stdout.contains("The game has not started yet. Use the start command to begin."));
    assert!(stdout.contains("Invalid direction. Use: up, down, left, right."));
}

#[test]
fn json_session_emits_reply_objects() {
    let output = run_session(&["--json"], "start\nquit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout
        .lines()
        .any(|line| line == r#"{"ok":true,"message":"Game started!"}"#));
}

#[test]
fn missing_catalog_file_fails() {
    let output = run_session(&["--maps", "does/not/exist.toml"], "");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("failed to read map catalog"));
}
