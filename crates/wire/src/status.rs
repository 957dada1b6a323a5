// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status and log payloads.

use dw_core::{ProcessId, ProcessSummary};
use serde::{Deserialize, Serialize};

/// Operational overview of the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    pub total_live: usize,
    pub running: usize,
    pub capacity: usize,
    #[serde(default)]
    pub uptime_secs: u64,
    #[serde(default)]
    pub processes: Vec<ProcessSummary>,
}

/// How much of a log to return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LogMode {
    /// All retained generations, oldest first
    Full,
    /// Last `lines` lines
    Tail { lines: usize },
}

impl Default for LogMode {
    fn default() -> Self {
        LogMode::Tail { lines: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogChunk {
    pub pid: ProcessId,
    pub content: String,
    /// Bytes retained on disk across all generations
    pub total_bytes: u64,
    /// Set when a full read was downgraded to a tail
    #[serde(default)]
    pub truncated: bool,
}
