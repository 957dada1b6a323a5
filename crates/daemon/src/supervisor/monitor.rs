// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background liveness polling, failure classification, and restarts.
//!
//! A tick only polls children and claims transitions in the registry. The
//! slow part (grace periods, relaunches, cleanup) runs in follow-up tasks,
//! so one hung child never delays exit detection for the rest.

use std::time::Duration;

use dw_core::{
    ChildExit, Clock, DeploymentId, ExitDecision, NotificationKind, ProcessId, ProcessRecord,
    ProcessState, StopClaim,
};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::teardown::{drain_pumps, Outcome};
use super::{launch, signal, Supervisor};
use crate::notify::Notifier;
use crate::provision::Provisioner;

/// Reason reported when a child outlives the configured maximum runtime.
pub const RUNTIME_EXCEEDED: &str = "exceeded maximum runtime";

enum Polled {
    Alive,
    Exited(ChildExit),
    /// A stop or restart holds the child right now
    Detached,
}

/// Work a tick has claimed and handed off.
enum FollowUp {
    Finalize(ProcessId, Outcome),
    Restart { pid: ProcessId, attempt: u32 },
    Expire { pid: ProcessId, deployment: DeploymentId },
}

impl<P: Provisioner, N: Notifier, C: Clock> Supervisor<P, N, C> {
    /// Run [`tick`](Self::tick) every monitor interval until cancelled.
    pub fn spawn_monitor(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let supervisor = self.clone();
        let period = self.inner.config.monitor_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_ms = period.as_millis() as u64, "monitor started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => supervisor.tick().await,
                }
            }
            tracing::info!("monitor stopped");
        })
    }

    /// Poll every running record once and hand off whatever changed.
    ///
    /// Returns once every record has been polled; restarts and teardowns
    /// continue in the background (see [`settle`](Self::settle)).
    pub async fn tick(&self) {
        let now = self.inner.clock.epoch_ms();
        let records: Vec<ProcessRecord> = self
            .inner
            .registry
            .snapshot()
            .into_iter()
            .filter(|r| matches!(r.state, ProcessState::Starting | ProcessState::Running))
            .collect();
        for record in records {
            if let Some(work) = self.check(&record) {
                self.hand_off(work);
            }
        }

        let swept = self.inner.logs.sweep(now);
        if swept > 0 {
            tracing::debug!(swept, "expired retained logs");
        }
    }

    /// Wait for every handed-off restart and teardown to finish.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.inner.followups.lock());
            if pending.is_empty() {
                return;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "monitor follow-up task failed");
                }
            }
        }
    }

    fn hand_off(&self, work: FollowUp) {
        let supervisor = self.clone();
        let mut followups = self.inner.followups.lock();
        while let Some(joined) = followups.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "monitor follow-up task failed");
            }
        }
        followups.spawn(async move { supervisor.follow_up(work).await });
    }

    async fn follow_up(&self, work: FollowUp) {
        match work {
            FollowUp::Finalize(pid, outcome) => self.finalize(pid, outcome).await,
            FollowUp::Restart { pid, attempt } => self.restart(pid, attempt).await,
            FollowUp::Expire { pid, deployment } => self.expire(pid, &deployment).await,
        }
    }

    /// Poll one record and claim its next transition, if any.
    fn check(&self, record: &ProcessRecord) -> Option<FollowUp> {
        match self.poll(&record.deployment) {
            Polled::Alive => {
                let limit = self.inner.config.process_timeout?;
                let runtime = Duration::from_millis(self.inner.clock.elapsed_ms(record.started_at_ms));
                if runtime <= limit {
                    return None;
                }
                let claim = self.inner.registry.update(record.id, |r| r.claim_stop());
                (claim == Ok(StopClaim::Claimed)).then(|| FollowUp::Expire {
                    pid: record.id,
                    deployment: record.deployment.clone(),
                })
            }
            Polled::Exited(exit) => self.classify_exit(record.id, exit),
            Polled::Detached => None,
        }
    }

    fn poll(&self, deployment: &DeploymentId) -> Polled {
        let mut attached = self.inner.attached.lock();
        let Some(child) = attached.get_mut(deployment).and_then(|a| a.child.as_mut()) else {
            return Polled::Detached;
        };
        match child.try_wait() {
            Ok(None) => Polled::Alive,
            Ok(Some(status)) => Polled::Exited(signal::exit_of(status)),
            Err(e) => {
                tracing::warn!(%deployment, error = %e, "liveness check failed");
                Polled::Exited(ChildExit::Unknown)
            }
        }
    }

    fn classify_exit(&self, pid: ProcessId, exit: ChildExit) -> Option<FollowUp> {
        let decision = self.inner.registry.update(pid, |r| r.on_exit(exit)).ok()?;
        match decision {
            ExitDecision::Completed => {
                tracing::info!(%pid, "process completed");
                Some(FollowUp::Finalize(pid, Outcome::Completed))
            }
            ExitDecision::GiveUp { reason } => {
                tracing::warn!(%pid, %reason, "restarts exhausted");
                Some(FollowUp::Finalize(pid, Outcome::Failed(reason)))
            }
            ExitDecision::Restart { attempt } => {
                tracing::warn!(%pid, exit = %exit.describe(), attempt, "process failed, restarting");
                Some(FollowUp::Restart { pid, attempt })
            }
            ExitDecision::AlreadyClaimed => {
                tracing::debug!(%pid, "exit already handled");
                None
            }
        }
    }

    /// Force-stop a child the monitor claimed for outliving the maximum
    /// runtime.
    async fn expire(&self, pid: ProcessId, deployment: &DeploymentId) {
        tracing::warn!(%pid, %deployment, "maximum runtime exceeded, stopping");
        let child = self.inner.attached.lock().get_mut(deployment).and_then(|a| a.child.take());
        if let Some(mut child) = child {
            signal::terminate(&mut child, self.inner.config.stop_grace).await;
        }
        self.finalize(pid, Outcome::Failed(RUNTIME_EXCEEDED.to_string())).await;
    }

    /// Relaunch a `Restarting` record with its script, environment, and sink.
    ///
    /// A stop that claims the record meanwhile makes the commit fail; the
    /// new child is then killed here and the waiting stop is signalled.
    pub(super) async fn restart(&self, old_pid: ProcessId, attempt: u32) {
        let inner = &self.inner;
        let Ok(record) = inner.registry.get(old_pid) else {
            return;
        };

        let taken = inner
            .attached
            .lock()
            .get_mut(&record.deployment)
            .map(|a| (std::mem::take(&mut a.pumps), a.sink.clone(), a.restart_done.clone()));
        let Some((old_pumps, sink, restart_done)) = taken else {
            return;
        };
        // Leftovers of the failed run must not overlap the relaunch
        signal::kill_group(old_pid.as_u32()).await;
        drain_pumps(old_pumps).await;

        if inner.registry.get(old_pid).map(|r| r.state) != Ok(ProcessState::Restarting) {
            tracing::info!(pid = %old_pid, "restart cancelled by stop before relaunch");
            self.finalize(old_pid, Outcome::Stopped).await;
            restart_done.notify_one();
            return;
        }

        let now = inner.clock.epoch_ms();
        inner.logs.mark_restart(&sink, attempt, now);

        let launched =
            match launch::spawn(&record.environment, &record.script_path, &record.work_dir, &sink) {
                Ok(launched) => launched,
                Err(e) => {
                    tracing::error!(pid = %old_pid, error = %e, "relaunch failed");
                    let outcome = if self.abandon_restart(old_pid) {
                        Outcome::Stopped
                    } else {
                        Outcome::Failed(format!("relaunch failed: {e}"))
                    };
                    self.finalize(old_pid, outcome).await;
                    restart_done.notify_one();
                    return;
                }
            };

        let new_pid = launched.pid;
        if let Some(entry) = inner.attached.lock().get_mut(&record.deployment) {
            entry.child = Some(launched.child);
            entry.pumps = launched.pumps;
        }

        match inner.registry.rekey(old_pid, new_pid, |r| r.commit_relaunch(new_pid, now)) {
            Ok(true) => {
                tracing::info!(pid = %new_pid, old_pid = %old_pid, attempt, "process restarted");
                let mut committed = record;
                committed.id = new_pid;
                self.notify(
                    &committed,
                    NotificationKind::Restarted { attempt, max_restarts: committed.max_restarts },
                    None,
                )
                .await;
            }
            Ok(false) => {
                tracing::info!(pid = %old_pid, "restart cancelled by stop");
                self.kill_relaunched(&record.deployment).await;
                self.finalize(old_pid, Outcome::Stopped).await;
                restart_done.notify_one();
            }
            Err(e) => {
                tracing::error!(pid = %old_pid, new_pid = %new_pid, error = %e, "cannot commit relaunch");
                self.kill_relaunched(&record.deployment).await;
                let outcome = if self.abandon_restart(old_pid) {
                    Outcome::Stopped
                } else {
                    Outcome::Failed(e.to_string())
                };
                self.finalize(old_pid, outcome).await;
                restart_done.notify_one();
            }
        }
    }

    /// Give up on a pending restart. Returns true when a stop had already
    /// claimed the record.
    fn abandon_restart(&self, pid: ProcessId) -> bool {
        self.inner
            .registry
            .update(pid, |r| {
                let stopped = r.state != ProcessState::Restarting;
                r.state = ProcessState::Terminated;
                stopped
            })
            .unwrap_or(true)
    }

    async fn kill_relaunched(&self, deployment: &DeploymentId) {
        let child = self.inner.attached.lock().get_mut(deployment).and_then(|a| a.child.take());
        if let Some(mut child) = child {
            signal::terminate(&mut child, self.inner.config.stop_grace).await;
        }
    }
}
