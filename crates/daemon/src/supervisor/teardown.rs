// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stopping children and releasing everything a record owns.

use std::path::Path;
use std::time::Duration;

use dw_core::{Clock, NotificationKind, ProcessId, ProcessState, StopClaim};

use super::{signal, Attached, Supervisor};
use crate::notify::Notifier;
use crate::provision::Provisioner;

/// How long teardown waits for output pumps once the child is gone.
const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a record is being finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Stopped,
    Failed(String),
}

impl Outcome {
    fn kind(self) -> NotificationKind {
        match self {
            Outcome::Completed => NotificationKind::Completed,
            Outcome::Stopped => NotificationKind::Stopped,
            Outcome::Failed(reason) => NotificationKind::FailedPermanently { reason },
        }
    }
}

impl<P: Provisioner, N: Notifier, C: Clock> Supervisor<P, N, C> {
    /// Stop a process: SIGTERM its group, wait the grace period, SIGKILL,
    /// then clean up.
    ///
    /// Unknown and already-finished ids are a no-op. Returns whether this
    /// call found the process live.
    pub async fn stop(&self, pid: ProcessId) -> bool {
        let claimed = self.inner.registry.update(pid, |r| (r.claim_stop(), r.deployment.clone()));
        let (claim, deployment) = match claimed {
            Ok(claimed) => claimed,
            Err(_) => {
                tracing::debug!(%pid, "stop: no such process");
                return false;
            }
        };

        match claim {
            StopClaim::Claimed => {
                tracing::info!(%pid, %deployment, "stopping process");
                let child = self
                    .inner
                    .attached
                    .lock()
                    .get_mut(&deployment)
                    .and_then(|a| a.child.take());
                if let Some(mut child) = child {
                    let exit = signal::terminate(&mut child, self.inner.config.stop_grace).await;
                    tracing::debug!(%pid, exit = %exit.describe(), "child stopped");
                }
                self.finalize(pid, Outcome::Stopped).await;
                true
            }
            StopClaim::ClaimedDuringRestart => {
                tracing::info!(%pid, %deployment, "stop claimed pending restart");
                let done = self.inner.attached.lock().get(&deployment).map(|a| a.restart_done.clone());
                if let Some(done) = done {
                    let wait = self.inner.config.stop_grace * 2 + Duration::from_secs(5);
                    if tokio::time::timeout(wait, done.notified()).await.is_err() {
                        tracing::warn!(%pid, "restart did not hand back teardown in time");
                    }
                }
                true
            }
            StopClaim::NotLive => {
                tracing::debug!(%pid, "stop: process already finishing");
                false
            }
        }
    }

    /// Stop every live record concurrently and wait for monitor follow-ups.
    pub async fn shutdown_all(&self) {
        let live: Vec<ProcessId> = self
            .inner
            .registry
            .snapshot()
            .into_iter()
            .filter(|r| r.state.is_live())
            .map(|r| r.id)
            .collect();
        if !live.is_empty() {
            tracing::info!(count = live.len(), "stopping all processes");
        }
        futures_util::future::join_all(live.into_iter().map(|pid| self.stop(pid))).await;
        // Expiries and restarts the monitor already claimed
        self.settle().await;
        self.inner.logs.purge_retained();
    }

    /// Release a record's resources exactly once and remove it.
    ///
    /// The caller must own the record's terminal transition and the child
    /// must have exited. A second call for the same record does nothing.
    pub(crate) async fn finalize(&self, pid: ProcessId, outcome: Outcome) {
        let inner = &self.inner;
        let record = inner.registry.update(pid, |r| {
            if r.state == ProcessState::CleanedUp {
                return None;
            }
            r.state = ProcessState::CleanedUp;
            Some(r.clone())
        });
        let Ok(Some(record)) = record else {
            tracing::debug!(%pid, "already cleaned up");
            return;
        };

        // Nothing may still run against the script or environment below
        let attached = inner.attached.lock().remove(&record.deployment);
        match attached {
            Some(attached) => self.release_attached(attached, Some(pid)).await,
            None => signal::kill_group(pid.as_u32()).await,
        }
        if let Err(e) = inner.provisioner.release(&record.environment).await {
            tracing::warn!(%pid, error = %e, "failed to release environment");
        }
        remove_work_dir(&record.work_dir).await;
        let retained = inner.logs.release(pid, &record.log_path, inner.clock.epoch_ms());
        let _ = inner.registry.remove(pid);

        tracing::info!(
            %pid,
            deployment = %record.deployment,
            outcome = ?outcome,
            log_retained_secs = retained,
            "process cleaned up"
        );
        self.notify(&record, outcome.kind(), Some(retained)).await;
    }

    /// Kill and reap the child if it is still attached, kill what is left of
    /// `group`, then drain the pumps and close the sink.
    pub(super) async fn release_attached(&self, mut attached: Attached, group: Option<ProcessId>) {
        if let Some(mut child) = attached.child.take() {
            signal::terminate(&mut child, Duration::ZERO).await;
        }
        if let Some(pid) = group {
            signal::kill_group(pid.as_u32()).await;
        }
        drain_pumps(std::mem::take(&mut attached.pumps)).await;
        attached.sink.close();
    }
}

/// Wait for output pumps to reach EOF; abort stragglers (a grandchild may
/// still hold the pipe open).
pub(crate) async fn drain_pumps(pumps: Vec<tokio::task::JoinHandle<()>>) {
    for mut pump in pumps {
        if tokio::time::timeout(PUMP_DRAIN_TIMEOUT, &mut pump).await.is_err() {
            pump.abort();
        }
    }
}

pub(crate) async fn remove_work_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to remove work directory"),
    }
}
