// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dw_core::{OwnerContext, ProcessId};
use serde::{Deserialize, Serialize};

use super::Query;

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Read-only query
    Query { query: Query },

    /// Run a script as a supervised child
    Deploy {
        script_name: String,
        script: Vec<u8>,
        /// Requirements-style dependency list; overrides discovery
        #[serde(default, skip_serializing_if = "Option::is_none")]
        manifest: Option<String>,
        owner: OwnerContext,
        /// Consume a manifest staged for `owner` within the manifest window
        #[serde(default)]
        wait_for_manifest: bool,
    },

    /// Stage a dependency manifest for the owner's next deploy
    Manifest { owner: OwnerContext, content: String },

    /// Stop a process; unknown or finished ids succeed
    Stop { pid: ProcessId },

    /// Drain queued notifications for an owner
    Notifications { owner: OwnerContext },

    /// Stop everything and exit; requires the configured token
    Shutdown {
        #[serde(default)]
        token: Option<String>,
    },
}

impl Request {
    /// True for requests that never change daemon state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Request::Ping | Request::Hello { .. } | Request::Query { .. })
    }
}
