// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Size-bounded rotating log file shared by a deployment's output pumps.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{backup_path, LogError, LogLimits};

/// Handle to one deployment's active log file.
///
/// Clones share the file. Writes go straight to disk; when a write would
/// push the active file past `max_bytes` the file is rotated first:
/// `<name>.1` becomes `<name>.2` and so on, the oldest generation beyond
/// `backups` is deleted, and the active file becomes `<name>.1`.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<RotatingFile>>,
}

struct RotatingFile {
    path: PathBuf,
    file: Option<File>,
    size: u64,
    limits: LogLimits,
}

impl LogSink {
    pub fn open(path: &Path, limits: LogLimits) -> Result<Self, LogError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            inner: Arc::new(Mutex::new(RotatingFile {
                path: path.to_path_buf(),
                file: Some(file),
                size,
                limits,
            })),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.inner.lock().path.clone()
    }

    /// Append raw bytes. Writes after [`close`](Self::close) are dropped.
    pub fn write(&self, bytes: &[u8]) -> Result<(), LogError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock();
        if inner.file.is_none() {
            return Ok(());
        }
        let len = bytes.len() as u64;
        if inner.limits.max_bytes > 0 && inner.size > 0 && inner.size + len > inner.limits.max_bytes {
            inner.rotate()?;
        }
        if let Some(file) = inner.file.as_mut() {
            file.write_all(bytes)?;
        }
        inner.size += len;
        Ok(())
    }

    pub fn write_line(&self, line: &str) -> Result<(), LogError> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        self.write(&bytes)
    }

    /// Release the file handle. Files on disk are untouched.
    pub fn close(&self) {
        self.inner.lock().file = None;
    }
}

impl RotatingFile {
    fn rotate(&mut self) -> Result<(), LogError> {
        self.file = None;
        let backups = self.limits.backups;
        if backups == 0 {
            remove_if_present(&self.path)?;
        } else {
            remove_if_present(&backup_path(&self.path, backups))?;
            for i in (1..backups).rev() {
                rename_if_present(&backup_path(&self.path, i), &backup_path(&self.path, i + 1))?;
            }
            rename_if_present(&self.path, &backup_path(&self.path, 1))?;
        }
        self.file = Some(OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?);
        self.size = 0;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn rename_if_present(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
