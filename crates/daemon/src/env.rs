// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Numeric and boolean helpers return `None` when the variable is unset or
//! unparsable so callers can fall back to the config file, then defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: DW_STATE_DIR > XDG_STATE_HOME/dw > ~/.local/state/dw
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = non_empty("DW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("dw"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/dw"))
}

/// Explicit config file path (`DW_CONFIG`)
pub fn config_path() -> Option<PathBuf> {
    non_empty("DW_CONFIG").map(PathBuf::from)
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    millis("DW_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Token that authorizes `Request::Shutdown`. Unset or empty disables it.
pub fn shutdown_token() -> Option<String> {
    non_empty("DW_SHUTDOWN_TOKEN")
}

pub fn max_processes() -> Option<usize> {
    parse("DW_MAX_PROCESSES")
}

pub fn max_restarts() -> Option<u32> {
    parse("DW_MAX_RESTARTS")
}

pub fn monitor_interval() -> Option<Duration> {
    millis("DW_MONITOR_INTERVAL_MS")
}

/// Delay between SIGTERM and SIGKILL when stopping a process
pub fn stop_grace() -> Option<Duration> {
    millis("DW_STOP_GRACE_MS")
}

/// Maximum child runtime; `0` means unlimited
pub fn process_timeout() -> Option<Duration> {
    secs("DW_PROCESS_TIMEOUT_SECS")
}

pub fn max_script_bytes() -> Option<u64> {
    parse("DW_MAX_SCRIPT_BYTES")
}

pub fn log_max_bytes() -> Option<u64> {
    parse("DW_LOG_MAX_BYTES")
}

pub fn log_backups() -> Option<usize> {
    parse("DW_LOG_BACKUPS")
}

/// Retained log size above which full reads are downgraded to a tail
pub fn log_transfer_limit() -> Option<u64> {
    parse("DW_LOG_TRANSFER_LIMIT")
}

/// How long a finished process's log stays fetchable
pub fn log_retention() -> Option<Duration> {
    secs("DW_LOG_RETENTION_SECS")
}

/// Host interpreter used for environments and syntax checks
pub fn python() -> Option<PathBuf> {
    non_empty("DW_PYTHON").map(PathBuf::from)
}

pub fn use_venv() -> Option<bool> {
    flag("DW_USE_VENV")
}

pub fn auto_install_deps() -> Option<bool> {
    flag("DW_AUTO_INSTALL_DEPS")
}

/// How long a deploy waits for a staged manifest
pub fn manifest_window() -> Option<Duration> {
    secs("DW_MANIFEST_WINDOW_SECS")
}

/// Mirror notifications to the desktop
pub fn desktop_notify() -> Option<bool> {
    flag("DW_DESKTOP_NOTIFY")
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty(name).and_then(|s| s.trim().parse().ok())
}

fn millis(name: &str) -> Option<Duration> {
    parse::<u64>(name).map(Duration::from_millis)
}

fn secs(name: &str) -> Option<Duration> {
    parse::<u64>(name).map(Duration::from_secs)
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive
fn flag(name: &str) -> Option<bool> {
    match non_empty(name)?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
