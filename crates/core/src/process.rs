// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process record and its lifecycle state machine.
//!
//! A record moves `Starting -> Running` at launch. When the child exits it is
//! classified by [`ProcessRecord::on_exit`]: a clean exit completes, a failure
//! either enters `Restarting` (while restarts remain) or gives up with
//! `Terminated`. [`ProcessRecord::claim_stop`] moves any live record to
//! `Terminated`. All transitions happen under the registry lock, so whichever
//! caller applies its transition first owns the follow-up work.

use crate::environment::EnvironmentHandle;
use crate::id::DeploymentId;
use crate::owner::OwnerContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// OS process identifier of the current child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ProcessId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ProcessState {
    Starting,
    Running,
    /// Child exited on its own with this code
    Exited(i32),
    /// Child ended abnormally (signal, lost handle)
    Failed(String),
    Restarting,
    Terminated,
    CleanedUp,
}

crate::simple_display! {
    ProcessState {
        Starting => "starting",
        Running => "running",
        Exited(..) => "exited",
        Failed(..) => "failed",
        Restarting => "restarting",
        Terminated => "terminated",
        CleanedUp => "cleaned_up",
    }
}

impl ProcessState {
    /// A live record has (or is about to have) an OS child and holds a slot.
    pub fn is_live(&self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Running | ProcessState::Restarting)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Terminated | ProcessState::CleanedUp)
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Code(i32),
    Signal(i32),
    /// Exit status unavailable (handle lost or wait failed)
    Unknown,
}

impl ChildExit {
    pub fn is_success(&self) -> bool {
        matches!(self, ChildExit::Code(0))
    }

    pub fn describe(&self) -> String {
        match self {
            ChildExit::Code(code) => format!("exited with code {}", code),
            ChildExit::Signal(sig) => format!("killed by signal {}", sig),
            ChildExit::Unknown => "exit status unavailable".to_string(),
        }
    }

    /// Failure state this exit leaves on the record.
    fn failure_state(&self) -> ProcessState {
        match self {
            ChildExit::Code(code) => ProcessState::Exited(*code),
            other => ProcessState::Failed(other.describe()),
        }
    }
}

/// What the supervisor should do after [`ProcessRecord::on_exit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitDecision {
    /// Exit 0; record is `Exited(0)` and should be cleaned up.
    Completed,
    /// Record is `Restarting`; relaunch as restart number `attempt`.
    Restart { attempt: u32 },
    /// Restarts exhausted; record is `Terminated`.
    GiveUp { reason: String },
    /// Someone else already owns a transition for this record.
    AlreadyClaimed,
}

/// Result of [`ProcessRecord::claim_stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopClaim {
    /// Caller now owns signalling and cleanup.
    Claimed,
    /// The pending restart owns teardown; caller waits for it.
    ClaimedDuringRestart,
    /// Nothing to do: record is already on its way out.
    NotLive,
}

/// One managed child and everything it exclusively owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub deployment: DeploymentId,
    pub state: ProcessState,
    pub script_name: String,
    pub script_path: PathBuf,
    pub work_dir: PathBuf,
    pub environment: EnvironmentHandle,
    pub log_path: PathBuf,
    pub owner: OwnerContext,
    pub started_at_ms: u64,
    pub restart_count: u32,
    pub max_restarts: u32,
}

impl ProcessRecord {
    /// Move a starting record to running; other states are left alone.
    pub fn promote(&mut self) -> bool {
        if self.state == ProcessState::Starting {
            self.state = ProcessState::Running;
            true
        } else {
            false
        }
    }

    pub fn restarts_left(&self) -> u32 {
        self.max_restarts.saturating_sub(self.restart_count)
    }

    /// Classify an observed child exit and apply the matching transition.
    pub fn on_exit(&mut self, exit: ChildExit) -> ExitDecision {
        if !matches!(self.state, ProcessState::Starting | ProcessState::Running) {
            return ExitDecision::AlreadyClaimed;
        }
        if exit.is_success() {
            self.state = ProcessState::Exited(0);
            return ExitDecision::Completed;
        }
        self.state = exit.failure_state();
        if self.restart_count < self.max_restarts {
            self.restart_count += 1;
            self.state = ProcessState::Restarting;
            ExitDecision::Restart { attempt: self.restart_count }
        } else {
            self.state = ProcessState::Terminated;
            ExitDecision::GiveUp { reason: exit.describe() }
        }
    }

    /// Claim a live record for stopping.
    pub fn claim_stop(&mut self) -> StopClaim {
        match self.state {
            ProcessState::Starting | ProcessState::Running => {
                self.state = ProcessState::Terminated;
                StopClaim::Claimed
            }
            ProcessState::Restarting => {
                self.state = ProcessState::Terminated;
                StopClaim::ClaimedDuringRestart
            }
            _ => StopClaim::NotLive,
        }
    }

    /// Attach a relaunched child. Refuses unless the record is still
    /// `Restarting`, i.e. no stop claimed it meanwhile.
    pub fn commit_relaunch(&mut self, new_id: ProcessId, now_ms: u64) -> bool {
        if self.state != ProcessState::Restarting {
            return false;
        }
        self.id = new_id;
        self.state = ProcessState::Running;
        self.started_at_ms = now_ms;
        true
    }

    pub fn summary(&self, now_ms: u64) -> ProcessSummary {
        ProcessSummary {
            id: self.id,
            deployment: self.deployment.clone(),
            state: self.state.clone(),
            script_name: self.script_name.clone(),
            owner: self.owner.clone(),
            started_at_ms: self.started_at_ms,
            runtime_secs: now_ms.saturating_sub(self.started_at_ms) / 1000,
            restart_count: self.restart_count,
            max_restarts: self.max_restarts,
            isolated: self.environment.isolated,
        }
    }
}

crate::builder! {
    pub struct ProcessRecordBuilder => ProcessRecord {
        into {
            script_name: String = "job.py",
            script_path: PathBuf = "/tmp/dw-test/work/job.py",
            work_dir: PathBuf = "/tmp/dw-test/work",
            log_path: PathBuf = "/tmp/dw-test/logs/job.log",
            owner: OwnerContext = "tester",
        }
        set {
            id: ProcessId = ProcessId(4242),
            deployment: DeploymentId = DeploymentId::new(),
            state: ProcessState = ProcessState::Running,
            environment: EnvironmentHandle = EnvironmentHandle::shared("/usr/bin/python3"),
            started_at_ms: u64 = 1_000_000,
            restart_count: u32 = 0,
            max_restarts: u32 = 3,
        }
    }
}

/// Read-only view of a record for status and listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub id: ProcessId,
    pub deployment: DeploymentId,
    pub state: ProcessState,
    pub script_name: String,
    pub owner: OwnerContext,
    pub started_at_ms: u64,
    pub runtime_secs: u64,
    pub restart_count: u32,
    pub max_restarts: u32,
    #[serde(default)]
    pub isolated: bool,
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
