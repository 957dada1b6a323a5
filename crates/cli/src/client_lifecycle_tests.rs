// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn startup_error_after_blank_line() {
    let log = "\
--- dwd: starting (pid: 12345) ---

ERROR Failed to start daemon: failed to acquire lock: daemon already running?
";
    assert_eq!(
        parse_startup_error(log).as_deref(),
        Some("failed to acquire lock: daemon already running?")
    );
}

#[test]
fn startup_without_error() {
    let log = "\
--- dwd: starting (pid: 12345) ---

2026-01-01T00:00:00Z  INFO dwd: daemon started
";
    assert_eq!(parse_startup_error(log), None);
}

#[test]
fn last_startup_wins() {
    let log = "\
--- dwd: starting (pid: 100) ---

ERROR Failed to start daemon: first failure
--- dwd: starting (pid: 200) ---

2026-01-01T00:00:00Z ERROR dwd: Failed to start daemon: second failure
ERROR Failed to start daemon: second failure
";
    assert_eq!(parse_startup_error(log).as_deref(), Some("second failure"));
}

#[test]
fn earlier_error_is_ignored_after_clean_start() {
    let log = "\
--- dwd: starting (pid: 100) ---
ERROR Failed to start daemon: old failure
--- dwd: starting (pid: 200) ---
INFO daemon started
";
    assert_eq!(parse_startup_error(log), None);
}

#[test]
fn no_marker() {
    assert_eq!(parse_startup_error("some random log content\n"), None);
}

#[test]
#[serial]
fn explicit_daemon_binary_wins() {
    std::env::set_var("DW_DAEMON_BINARY", "/opt/dw/bin/dwd");
    assert_eq!(find_dwd_binary(), PathBuf::from("/opt/dw/bin/dwd"));
    std::env::remove_var("DW_DAEMON_BINARY");
}

#[tokio::test]
#[serial]
async fn stop_without_daemon_reports_not_running() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("DW_STATE_DIR", dir.path());
    let stopped = daemon_stop(None).await.unwrap();
    std::env::remove_var("DW_STATE_DIR");
    assert!(!stopped);
}

#[test]
#[serial]
fn daemon_log_lives_beside_socket() {
    std::env::set_var("DW_STATE_DIR", "/srv/dw");
    assert_eq!(daemon_log_path().unwrap(), PathBuf::from("/srv/dw/daemon.log"));
    std::env::remove_var("DW_STATE_DIR");
}
