// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn config() -> SupervisorConfig {
    SupervisorConfig::default().max_script_bytes(16)
}

#[test]
fn accepts_small_utf8_script() {
    let text = check_script(&config(), "bot.py", b"print('hi')\n").unwrap();
    assert_eq!(text, "print('hi')\n");
}

#[test]
fn rejects_empty_script() {
    let err = check_script(&config(), "bot.py", b"").unwrap_err();
    assert!(matches!(err, DeployError::Validation(ref m) if m.contains("empty")), "{err}");
}

#[test]
fn rejects_oversized_script() {
    let err = check_script(&config(), "bot.py", &[b'x'; 17]).unwrap_err();
    assert!(matches!(err, DeployError::Validation(ref m) if m.contains("limit is 16")), "{err}");
}

#[test]
fn rejects_non_utf8_script() {
    let err = check_script(&config(), "bot.py", &[0xff, 0xfe, 0x00]).unwrap_err();
    assert!(matches!(err, DeployError::Validation(_)));
}

#[yare::parameterized(
    empty = { "" },
    dot = { "." },
    dotdot = { ".." },
    hidden = { ".env" },
    nested = { "a/b.py" },
    traversal = { "../etc/passwd" },
    backslash = { "a\\b.py" },
    nul = { "a\0.py" },
)]
fn rejects_bad_names(name: &str) {
    assert!(check_name(name).is_err(), "{name:?} should be rejected");
}

#[yare::parameterized(
    python = { "bot.py" },
    dashed = { "my-bot_v2.py" },
    no_extension = { "worker" },
)]
fn accepts_plain_names(name: &str) {
    check_name(name).unwrap();
}

#[tokio::test]
async fn syntax_check_passes_valid_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.sh");
    std::fs::write(&path, "echo hello\n").unwrap();
    let check = SyntaxCheck::new("sh", &["-n", SCRIPT_PLACEHOLDER]);
    check_syntax(&check, &path, Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn syntax_check_reports_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.sh");
    std::fs::write(&path, "if then fi (\n").unwrap();
    let check = SyntaxCheck::new("sh", &["-n", SCRIPT_PLACEHOLDER]);
    let err = check_syntax(&check, &path, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, DeployError::Validation(ref m) if m.starts_with("syntax error")), "{err}");
}

#[tokio::test]
async fn missing_checker_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.py");
    std::fs::write(&path, "print(1)\n").unwrap();
    let check = SyntaxCheck::new("/nonexistent/python3", &["-m", "py_compile", SCRIPT_PLACEHOLDER]);
    check_syntax(&check, &path, Duration::from_secs(5)).await.unwrap();
}
