// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reading rotated log generations.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::backup_path;

const TAIL_CHUNK: u64 = 8 * 1024;

/// Existing generations of a log, oldest first, active file last.
pub fn generations(path: &Path, backups: usize) -> Vec<PathBuf> {
    (1..=backups)
        .rev()
        .map(|i| backup_path(path, i))
        .chain(std::iter::once(path.to_path_buf()))
        .filter(|p| p.exists())
        .collect()
}

pub fn retained_bytes(path: &Path, backups: usize) -> u64 {
    generations(path, backups).iter().filter_map(|p| fs::metadata(p).ok()).map(|m| m.len()).sum()
}

/// Every retained generation concatenated, oldest first.
pub fn read_full(path: &Path, backups: usize) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    for generation in generations(path, backups) {
        match File::open(&generation) {
            Ok(mut file) => {
                file.read_to_end(&mut bytes)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Last `lines` lines across generations, read backwards from the end so
/// large logs are not loaded whole.
pub fn read_tail(path: &Path, backups: usize, lines: usize) -> std::io::Result<String> {
    if lines == 0 {
        return Ok(String::new());
    }
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut newlines = 0usize;
    'generations: for generation in generations(path, backups).iter().rev() {
        let mut file = match File::open(generation) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        let mut pos = file.metadata()?.len();
        while pos > 0 {
            let step = TAIL_CHUNK.min(pos);
            pos -= step;
            file.seek(SeekFrom::Start(pos))?;
            let mut buf = vec![0u8; step as usize];
            file.read_exact(&mut buf)?;
            newlines += buf.iter().filter(|b| **b == b'\n').count();
            chunks.push(buf);
            // One extra newline guarantees the oldest wanted line is complete
            if newlines > lines {
                break 'generations;
            }
        }
    }
    let bytes: Vec<u8> = chunks.into_iter().rev().flatten().collect();
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    Ok(all[start..].join("\n"))
}

/// Delete every generation; missing files are fine.
pub fn delete_all(path: &Path, backups: usize) {
    for generation in generations(path, backups) {
        if let Err(e) = fs::remove_file(&generation) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %generation.display(), error = %e, "failed to delete log file");
            }
        }
    }
}

#[cfg(test)]
#[path = "read_tests.rs"]
mod tests;
