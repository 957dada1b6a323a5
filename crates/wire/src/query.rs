// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only queries against supervisor state.

use dw_core::ProcessId;
use serde::{Deserialize, Serialize};

use super::LogMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    /// Counts plus per-process entries
    Status,
    ListProcesses,
    /// Log output of a live or recently finished process
    GetLogs {
        pid: ProcessId,
        #[serde(default)]
        mode: LogMode,
    },
}
