// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dw_core::{Notification, ProcessId, ProcessSummary};
use serde::{Deserialize, Serialize};

use super::{LogChunk, StatusReport};

/// Machine-readable failure category carried by [`Response::Error`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Provision,
    Launch,
    CapacityExceeded,
    NotFound,
    DuplicateId,
    Unauthorized,
    #[default]
    Internal,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Deploy succeeded
    Deployed {
        process: ProcessSummary,
        /// Degraded isolation and similar caveats
        #[serde(default)]
        warnings: Vec<String>,
    },

    /// Manifest staged for the owner's next deploy
    ManifestStaged { packages: usize },

    /// Stop finished; `was_live` is false for unknown or already finished ids
    Stopped { pid: ProcessId, was_live: bool },

    Status { status: StatusReport },

    Processes { processes: Vec<ProcessSummary> },

    Logs { log: LogChunk },

    Notifications { notifications: Vec<Notification> },

    /// Error response
    Error {
        #[serde(default)]
        code: ErrorCode,
        message: String,
    },
}

impl Response {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error { code, message: message.into() }
    }
}
