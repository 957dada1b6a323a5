// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-deployment log files: rotation, reading, and post-cleanup retention.
//!
//! Logs live at `<logs_dir>/<deployment>.log` with rotated generations
//! `<deployment>.log.1 ..= .N`. After a deployment is cleaned up its log is
//! either deleted at once or kept for the retention period, indexed by the
//! last OS process id so `dw logs <pid>` keeps working briefly.

mod read;
mod sink;

pub use read::{read_full, read_tail};
pub use sink::LogSink;

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dw_core::{DeploymentId, OwnerContext, ProcessId};
use dw_wire::LogMode;
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("no log for process {0}")]
    NotFound(ProcessId),

    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rotation bounds for one log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLimits {
    /// Active file size that triggers rotation; 0 disables rotation
    pub max_bytes: u64,
    /// Rotated generations kept beside the active file
    pub backups: usize,
}

impl Default for LogLimits {
    fn default() -> Self {
        Self { max_bytes: 10 * 1024 * 1024, backups: 5 }
    }
}

/// Lines written at the top of a fresh log.
pub struct LogHeader<'a> {
    pub script_name: &'a str,
    pub deployment: &'a DeploymentId,
    pub owner: &'a OwnerContext,
    pub started_at_ms: u64,
}

struct RetainedLog {
    path: PathBuf,
    expires_at_ms: u64,
}

pub struct LogManager {
    dir: PathBuf,
    limits: LogLimits,
    retention: Duration,
    retained: Mutex<HashMap<ProcessId, RetainedLog>>,
}

impl LogManager {
    pub fn new(dir: impl Into<PathBuf>, limits: LogLimits, retention: Duration) -> Self {
        Self { dir: dir.into(), limits, retention, retained: Mutex::new(HashMap::new()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn limits(&self) -> LogLimits {
        self.limits
    }

    pub fn path_for(&self, deployment: &DeploymentId) -> PathBuf {
        self.dir.join(format!("{}.log", deployment))
    }

    /// Create the deployment's log and write its header.
    pub fn open(&self, header: &LogHeader<'_>) -> Result<LogSink, LogError> {
        let sink = LogSink::open(&self.path_for(header.deployment), self.limits)?;
        sink.write_line(&format!("=== {} ===", header.script_name))?;
        sink.write_line(&format!("deployment: {}", header.deployment))?;
        sink.write_line(&format!("owner: {}", header.owner))?;
        sink.write_line(&format!("started: {}", timestamp(header.started_at_ms)))?;
        Ok(sink)
    }

    /// Marker separating one run's output from the next.
    pub fn mark_restart(&self, sink: &LogSink, attempt: u32, at_ms: u64) {
        let line = format!("=== restart #{} at {} ===", attempt, timestamp(at_ms));
        if let Err(e) = sink.write_line(&line) {
            tracing::warn!(path = %sink.path().display(), error = %e, "failed to write restart marker");
        }
    }

    pub fn read(&self, path: &Path, mode: LogMode) -> Result<String, LogError> {
        let text = match mode {
            LogMode::Full => read::read_full(path, self.limits.backups)?,
            LogMode::Tail { lines } => read::read_tail(path, self.limits.backups, lines)?,
        };
        Ok(text)
    }

    pub fn retained_bytes(&self, path: &Path) -> u64 {
        read::retained_bytes(path, self.limits.backups)
    }

    /// Dispose of a finished deployment's log: keep it for the retention
    /// period, or delete it when retention is zero. Returns the seconds it
    /// stays available.
    pub fn release(&self, pid: ProcessId, path: &Path, now_ms: u64) -> u64 {
        let secs = self.retention.as_secs();
        if secs == 0 {
            read::delete_all(path, self.limits.backups);
            return 0;
        }
        let expires_at_ms = now_ms + self.retention.as_millis() as u64;
        let displaced =
            self.retained.lock().insert(pid, RetainedLog { path: path.to_path_buf(), expires_at_ms });
        // The OS reused the pid; the older log is no longer reachable
        if let Some(old) = displaced.filter(|old| old.path.as_path() != path) {
            tracing::debug!(%pid, path = %old.path.display(), "pid reused, dropping older retained log");
            read::delete_all(&old.path, self.limits.backups);
        }
        secs
    }

    /// Path of a released log still inside its retention period.
    pub fn retained_path(&self, pid: ProcessId) -> Option<PathBuf> {
        self.retained.lock().get(&pid).map(|r| r.path.clone())
    }

    /// Delete released logs whose retention expired. Returns how many went.
    pub fn sweep(&self, now_ms: u64) -> usize {
        let expired: Vec<PathBuf> = {
            let mut retained = self.retained.lock();
            let pids: Vec<ProcessId> =
                retained.iter().filter(|(_, r)| r.expires_at_ms <= now_ms).map(|(pid, _)| *pid).collect();
            pids.into_iter().filter_map(|pid| retained.remove(&pid)).map(|r| r.path).collect()
        };
        for path in &expired {
            read::delete_all(path, self.limits.backups);
        }
        expired.len()
    }

    /// Delete a log immediately (failed deploys).
    pub fn delete(&self, path: &Path) {
        read::delete_all(path, self.limits.backups);
    }

    /// Drop retention bookkeeping and delete everything still retained.
    pub fn purge_retained(&self) {
        let drained: Vec<RetainedLog> = self.retained.lock().drain().map(|(_, r)| r).collect();
        for log in drained {
            read::delete_all(&log.path, self.limits.backups);
        }
    }
}

/// `<path>.<n>` for rotated generation `n`.
pub(crate) fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

fn timestamp(epoch_ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| epoch_ms.to_string())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
