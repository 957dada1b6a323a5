// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::Duration;

use dw_core::ChildExit;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Child;

/// How long to wait for a SIGKILLed group to disappear.
const GROUP_EXIT_TIMEOUT: Duration = Duration::from_secs(5);
const GROUP_POLL: Duration = Duration::from_millis(20);

pub(crate) fn exit_of(status: ExitStatus) -> ChildExit {
    match (status.code(), status.signal()) {
        (Some(code), _) => ChildExit::Code(code),
        (None, Some(sig)) => ChildExit::Signal(sig),
        (None, None) => ChildExit::Unknown,
    }
}

/// Signal every process in the group led by `pid`. A group that is already
/// gone is not an error.
pub(crate) fn signal_group(pid: u32, signal: Signal) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, %signal, error = %e, "failed to signal process group"),
    }
}

/// Whether any non-zombie process is left in the group led by `pid`.
pub(crate) fn group_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match killpg(Pid::from_raw(raw), None::<Signal>) {
        Ok(()) => has_running_member(raw),
        Err(_) => false,
    }
}

/// Zombies still answer `killpg`; only count members that are running.
#[cfg(target_os = "linux")]
fn has_running_member(pgid: i32) -> bool {
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return true;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else {
            return false;
        };
        // `pid (comm) state ppid pgrp ...`; comm may contain spaces
        let Some((_, rest)) = stat.rsplit_once(')') else {
            return false;
        };
        let mut fields = rest.split_whitespace();
        let state = fields.next();
        let pgrp = fields.nth(1).and_then(|p| p.parse::<i32>().ok());
        state != Some("Z") && pgrp == Some(pgid)
    })
}

#[cfg(not(target_os = "linux"))]
fn has_running_member(_pgid: i32) -> bool {
    true
}

/// SIGKILL whatever is left of the group led by `pid` and wait until it is
/// empty. The leader must already be reaped.
pub(crate) async fn kill_group(pid: u32) {
    if !group_alive(pid) {
        return;
    }
    signal_group(pid, Signal::SIGKILL);
    let deadline = tokio::time::Instant::now() + GROUP_EXIT_TIMEOUT;
    while group_alive(pid) {
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(pid, "process group still present after SIGKILL");
            return;
        }
        tokio::time::sleep(GROUP_POLL).await;
    }
    tracing::debug!(pid, "killed leftover process group members");
}

/// SIGTERM the child's group, wait up to `grace`, then SIGKILL and reap.
/// Members the leader left behind are killed as well.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) -> ChildExit {
    let Some(pid) = child.id() else {
        // Already reaped by the monitor
        return match child.try_wait() {
            Ok(Some(status)) => exit_of(status),
            _ => ChildExit::Unknown,
        };
    };
    signal_group(pid, Signal::SIGTERM);
    let graceful = match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => Some(exit_of(status)),
        Ok(Err(e)) => {
            tracing::warn!(pid, error = %e, "wait failed after SIGTERM");
            None
        }
        Err(_) => {
            tracing::info!(pid, grace_ms = grace.as_millis() as u64, "grace period expired, sending SIGKILL");
            None
        }
    };
    let exit = match graceful {
        Some(exit) => exit,
        None => {
            signal_group(pid, Signal::SIGKILL);
            let _ = child.start_kill();
            match child.wait().await {
                Ok(status) => exit_of(status),
                Err(_) => ChildExit::Unknown,
            }
        }
    };
    kill_group(pid).await;
    exit
}
