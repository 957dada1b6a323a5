// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn daemon_log_tail_and_full() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daemon.log");
    std::fs::write(&path, "one\ntwo\nthree\nfour\n").unwrap();

    assert_eq!(read_daemon_log(&path, Some(2)).unwrap(), "three\nfour");
    assert_eq!(read_daemon_log(&path, Some(10)).unwrap(), "one\ntwo\nthree\nfour");
    assert_eq!(read_daemon_log(&path, None).unwrap(), "one\ntwo\nthree\nfour\n");
}

#[test]
fn missing_daemon_log_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let content = read_daemon_log(&dir.path().join("daemon.log"), Some(5)).unwrap();
    assert!(content.is_empty());
}

#[test]
fn not_running_status_omits_details() {
    let json = serde_json::to_value(DaemonStatus::not_running()).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "not_running" }));
}

#[test]
fn running_status_serializes_counts() {
    let status = DaemonStatus {
        status: "running",
        version: Some("1".to_string()),
        uptime_secs: Some(90),
        live: Some(2),
        capacity: Some(10),
    };
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["live"], 2);
    assert_eq!(json["capacity"], 10);
    assert_eq!(json["uptime_secs"], 90);
}
