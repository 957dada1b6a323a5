// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle notifications addressed to an owner.

use crate::id::DeploymentId;
use crate::owner::OwnerContext;
use crate::process::ProcessId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    Started,
    Restarted { attempt: u32, max_restarts: u32 },
    FailedPermanently { reason: String },
    Stopped,
    Completed,
}

impl NotificationKind {
    /// Short label used as a desktop notification title.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::Started => "started",
            NotificationKind::Restarted { .. } => "restarted",
            NotificationKind::FailedPermanently { .. } => "failed",
            NotificationKind::Stopped => "stopped",
            NotificationKind::Completed => "completed",
        }
    }
}

/// A lifecycle event for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub owner: OwnerContext,
    pub pid: ProcessId,
    pub deployment: DeploymentId,
    pub script_name: String,
    #[serde(flatten)]
    pub kind: NotificationKind,
    pub at_ms: u64,
    /// Seconds the log stays fetchable after cleanup, `Some(0)` when it was
    /// deleted, `None` while the process is still live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retained_secs: Option<u64>,
}

impl Notification {
    /// One-line message suitable for a chat reply or desktop toast.
    pub fn message(&self) -> String {
        let head = match &self.kind {
            NotificationKind::Started => {
                format!("{} started (pid {})", self.script_name, self.pid)
            }
            NotificationKind::Restarted { attempt, max_restarts } => format!(
                "{} restarted (attempt {}/{}, pid {})",
                self.script_name, attempt, max_restarts, self.pid
            ),
            NotificationKind::FailedPermanently { reason } => {
                format!("{} failed permanently: {}", self.script_name, reason)
            }
            NotificationKind::Stopped => format!("{} stopped (pid {})", self.script_name, self.pid),
            NotificationKind::Completed => {
                format!("{} completed successfully (pid {})", self.script_name, self.pid)
            }
        };
        match self.log_retained_secs {
            Some(0) => format!("{}; logs deleted", head),
            Some(secs) => format!("{}; logs available for {}s", head, secs),
            None => head,
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
