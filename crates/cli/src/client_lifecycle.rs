// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting and stopping the background daemon.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::client::{socket_path, ClientError, DaemonClient};

/// How long a background start may take to print `READY`
const START_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `daemon stop` waits for the socket to disappear
const STOP_TIMEOUT: Duration = Duration::from_secs(60);

const STARTUP_MARKER: &str = "--- dwd: starting";
const STARTUP_ERROR: &str = "Failed to start daemon: ";

/// Connect to a live daemon, starting one in the background if needed.
pub async fn connect_or_start() -> Result<DaemonClient, ClientError> {
    if let Ok(client) = DaemonClient::connect() {
        match client.ping().await {
            Ok(()) => return Ok(client),
            Err(e) if e.is_not_running() => {}
            Err(e) => return Err(e),
        }
    }
    start_background().await?;
    DaemonClient::connect()
}

/// Spawn `dwd` detached from the terminal and wait for `READY`.
async fn start_background() -> Result<(), ClientError> {
    let binary = find_dwd_binary();
    let mut child = Command::new(&binary)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|e| ClientError::StartFailed(format!("{}: {e}", binary.display())))?;

    let Some(stdout) = child.stdout.take() else {
        return Err(ClientError::StartFailed("daemon stdout unavailable".into()));
    };
    let mut lines = BufReader::new(stdout).lines();
    let ready = tokio::time::timeout(START_TIMEOUT, async {
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim() == "READY" {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    if ready {
        return Ok(());
    }
    let reason = startup_error_from_log()
        .unwrap_or_else(|| "daemon exited before it was ready".to_string());
    Err(ClientError::StartFailed(reason))
}

fn startup_error_from_log() -> Option<String> {
    let log_path = dw_daemon::env::state_dir().ok()?.join("daemon.log");
    let log = std::fs::read_to_string(log_path).ok()?;
    parse_startup_error(&log)
}

/// The error from the most recent startup attempt recorded in `daemon.log`.
pub fn parse_startup_error(log: &str) -> Option<String> {
    let start = log.rfind(STARTUP_MARKER)?;
    log[start..].lines().find_map(|line| {
        line.find(STARTUP_ERROR).map(|i| line[i + STARTUP_ERROR.len()..].trim().to_string())
    })
}

/// Ask the daemon to shut down and wait for it to exit.
///
/// Returns false when no daemon was running.
pub async fn daemon_stop(token: Option<String>) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect() {
        Ok(client) => client,
        Err(e) if e.is_not_running() => return Ok(false),
        Err(e) => return Err(e),
    };
    match client.shutdown(token).await {
        Ok(()) => {}
        Err(e) if e.is_not_running() => return Ok(false),
        Err(e) => return Err(e),
    }
    wait_for_exit(client.socket_path()).await;
    Ok(true)
}

/// Poll until the daemon removes its socket.
async fn wait_for_exit(socket: &Path) {
    let deadline = tokio::time::Instant::now() + STOP_TIMEOUT;
    while socket.exists() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Locate `dwd`: `DW_DAEMON_BINARY`, the dev build beside a debug CLI, a
/// sibling of the current executable, then `PATH`.
pub fn find_dwd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return path;
    }
    let current_exe = std::env::current_exe().ok();

    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .is_some_and(|s| s.contains("target/debug"));
    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/dwd"));
            if let Some(path) = dev_path.filter(|p| p.exists()) {
                return path;
            }
        }
    }

    if let Some(dir) = current_exe.as_ref().and_then(|exe| exe.parent()) {
        let sibling = dir.join("dwd");
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from("dwd")
}

/// `<state_dir>/daemon.log`
pub fn daemon_log_path() -> Result<PathBuf, ClientError> {
    let socket = socket_path()?;
    Ok(socket.with_file_name("daemon.log"))
}

#[cfg(test)]
#[path = "client_lifecycle_tests.rs"]
mod tests;
