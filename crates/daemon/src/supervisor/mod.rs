// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor core: launch, monitor, restart, and teardown of children.
//!
//! Record state lives in the [`Registry`]; the OS handles (child, output
//! pumps, log sink) live beside it in an attachment map keyed by
//! deployment. Every transition is decided by a single registry update, so
//! when the monitor and a stop race for the same record exactly one of them
//! owns the follow-up work and the other backs off.

mod config;
mod error;
mod launch;
mod monitor;
mod signal;
mod teardown;
mod validate;

pub use config::{SupervisorConfig, SyntaxCheck, SCRIPT_PLACEHOLDER};
pub use error::DeployError;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use dw_core::{
    Clock, DeploymentId, EnvironmentHandle, Notification, NotificationKind, OwnerContext,
    ProcessId, ProcessRecord, ProcessState, ProcessSummary,
};
use dw_wire::{LogChunk, LogMode, StatusReport};
use parking_lot::Mutex;
use tokio::process::Child;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};

use crate::logs::{LogError, LogHeader, LogManager, LogSink};
use crate::notify::Notifier;
use crate::provision::{ManifestInbox, ProvisionRequest, Provisioner};
use crate::registry::Registry;

/// Lines returned when a full log read is too large to transfer.
pub const DOWNGRADED_TAIL_LINES: usize = 1000;

/// A script submitted for supervision.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub script_name: String,
    pub script: Vec<u8>,
    pub manifest: Option<String>,
    pub owner: OwnerContext,
    /// Wait up to the manifest window for one staged by `owner`
    pub wait_for_manifest: bool,
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub process: ProcessSummary,
    /// Degraded isolation and similar caveats
    pub warnings: Vec<String>,
}

/// OS resources owned by one deployment.
struct Attached {
    child: Option<Child>,
    pumps: Vec<JoinHandle<()>>,
    sink: LogSink,
    /// Signalled when a restart hands teardown back to a waiting stop
    restart_done: Arc<Notify>,
}

/// What a deploy has created so far, undone if a later step fails.
#[derive(Default)]
struct Rollback {
    work_dir: Option<PathBuf>,
    environment: Option<EnvironmentHandle>,
    log: Option<PathBuf>,
    attached: Option<DeploymentId>,
}

struct Inner<P, N, C> {
    config: SupervisorConfig,
    registry: Registry,
    attached: Mutex<HashMap<DeploymentId, Attached>>,
    logs: LogManager,
    manifests: ManifestInbox,
    provisioner: P,
    notifier: N,
    clock: C,
    started: Instant,
    /// Restarts and teardowns handed off by the monitor
    followups: Mutex<JoinSet<()>>,
}

/// Handle to the supervisor; clones share state.
pub struct Supervisor<P, N, C> {
    inner: Arc<Inner<P, N, C>>,
}

impl<P, N, C> Clone for Supervisor<P, N, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P: Provisioner, N: Notifier, C: Clock> Supervisor<P, N, C> {
    pub fn new(config: SupervisorConfig, provisioner: P, notifier: N, clock: C) -> Self {
        let logs = LogManager::new(&config.logs_dir, config.log_limits, config.log_retention);
        let manifests = ManifestInbox::new(config.manifest_window);
        let registry = Registry::new(config.max_processes);
        let started = clock.now();
        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                attached: Mutex::new(HashMap::new()),
                logs,
                manifests,
                provisioner,
                notifier,
                clock,
                started,
                followups: Mutex::new(JoinSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn logs(&self) -> &LogManager {
        &self.inner.logs
    }

    /// Stage a manifest for the owner's next deploy; returns its package count.
    pub fn stage_manifest(&self, owner: OwnerContext, content: String) -> usize {
        self.inner.manifests.stage(owner, content)
    }

    /// Validate, provision, and launch a script.
    ///
    /// All or nothing: on error the work directory, environment, log, and
    /// any spawned child are gone before this returns.
    pub async fn deploy(&self, req: DeployRequest) -> Result<DeployOutcome, DeployError> {
        let script = validate::check_script(&self.inner.config, &req.script_name, &req.script)?;
        let registry = &self.inner.registry;
        if !registry.has_capacity() {
            return Err(DeployError::CapacityExceeded {
                live: registry.live_count(),
                max: registry.capacity(),
            });
        }

        let mut rollback = Rollback::default();
        match self.launch_new(&req, script, &mut rollback).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(script = %req.script_name, owner = %req.owner, error = %e, "deploy failed");
                self.roll_back(rollback).await;
                Err(e)
            }
        }
    }

    async fn launch_new(
        &self,
        req: &DeployRequest,
        script: String,
        rollback: &mut Rollback,
    ) -> Result<DeployOutcome, DeployError> {
        let inner = &self.inner;
        let config = &inner.config;
        let deployment = DeploymentId::new();

        let work_dir = config.work_dir.join(deployment.as_str());
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(|e| DeployError::Launch(format!("cannot create work directory: {e}")))?;
        rollback.work_dir = Some(work_dir.clone());
        let script_path = work_dir.join(&req.script_name);
        tokio::fs::write(&script_path, &req.script)
            .await
            .map_err(|e| DeployError::Launch(format!("cannot write script: {e}")))?;

        if let Some(check) = &config.syntax_check {
            validate::check_syntax(check, &script_path, config.syntax_timeout).await?;
        }

        let manifest = self.resolve_manifest(req).await;
        let provisioned = inner
            .provisioner
            .provision(ProvisionRequest { script, manifest, root: work_dir.join("env") })
            .await?;
        rollback.environment = Some(provisioned.handle.clone());
        for warning in &provisioned.warnings {
            tracing::warn!(%deployment, %warning, "degraded environment");
        }

        let now = inner.clock.epoch_ms();
        let sink = inner.logs.open(&LogHeader {
            script_name: &req.script_name,
            deployment: &deployment,
            owner: &req.owner,
            started_at_ms: now,
        })?;
        rollback.log = Some(sink.path());

        let launched = launch::spawn(&provisioned.handle, &script_path, &work_dir, &sink)
            .map_err(|e| {
                DeployError::Launch(format!("{}: {e}", provisioned.handle.interpreter.display()))
            })?;
        let pid = launched.pid;
        let record = ProcessRecord {
            id: pid,
            deployment: deployment.clone(),
            state: ProcessState::Starting,
            script_name: req.script_name.clone(),
            script_path,
            work_dir,
            environment: provisioned.handle,
            log_path: sink.path(),
            owner: req.owner.clone(),
            started_at_ms: now,
            restart_count: 0,
            max_restarts: config.max_restarts,
        };

        inner.attached.lock().insert(
            deployment.clone(),
            Attached {
                child: Some(launched.child),
                pumps: launched.pumps,
                sink,
                restart_done: Arc::new(Notify::new()),
            },
        );
        rollback.attached = Some(deployment.clone());
        inner.registry.insert(record.clone())?;

        let (promoted, summary) = inner
            .registry
            .update(pid, |r| (r.promote(), r.summary(now)))
            .unwrap_or_else(|_| (false, record.summary(now)));
        tracing::info!(
            %pid,
            %deployment,
            script = %req.script_name,
            owner = %req.owner,
            isolated = record.environment.isolated,
            "process started"
        );
        if promoted {
            self.notify(&record, NotificationKind::Started, None).await;
        }
        Ok(DeployOutcome { process: summary, warnings: provisioned.warnings })
    }

    async fn resolve_manifest(&self, req: &DeployRequest) -> Option<String> {
        if let Some(manifest) = &req.manifest {
            return Some(manifest.clone());
        }
        let manifests = &self.inner.manifests;
        if let Some(staged) = manifests.take(&req.owner) {
            return Some(staged);
        }
        if req.wait_for_manifest {
            manifests.wait_for(&req.owner).await
        } else {
            None
        }
    }

    async fn roll_back(&self, rollback: Rollback) {
        let inner = &self.inner;
        if let Some(deployment) = rollback.attached {
            let attached = inner.attached.lock().remove(&deployment);
            if let Some(attached) = attached {
                self.release_attached(attached, None).await;
            }
        }
        if let Some(env) = rollback.environment {
            if let Err(e) = inner.provisioner.release(&env).await {
                tracing::warn!(error = %e, "failed to release environment during rollback");
            }
        }
        if let Some(log) = rollback.log {
            inner.logs.delete(&log);
        }
        if let Some(dir) = rollback.work_dir {
            teardown::remove_work_dir(&dir).await;
        }
    }

    /// Live and pending records as summaries, oldest first.
    pub fn summaries(&self) -> Vec<ProcessSummary> {
        let now = self.inner.clock.epoch_ms();
        self.inner.registry.snapshot().iter().map(|r| r.summary(now)).collect()
    }

    pub fn status(&self) -> StatusReport {
        let processes = self.summaries();
        let running = processes.iter().filter(|p| p.state == ProcessState::Running).count();
        let total_live = processes.iter().filter(|p| p.state.is_live()).count();
        let uptime = self.inner.clock.now().saturating_duration_since(self.inner.started);
        StatusReport {
            total_live,
            running,
            capacity: self.inner.registry.capacity(),
            uptime_secs: uptime.as_secs(),
            processes,
        }
    }

    /// Read a process's log, or a recently cleaned-up one's within retention.
    ///
    /// A full read larger than the transfer limit comes back as the last
    /// [`DOWNGRADED_TAIL_LINES`] lines with `truncated` set.
    pub fn fetch_log(&self, pid: ProcessId, mode: LogMode) -> Result<LogChunk, LogError> {
        let logs = &self.inner.logs;
        let path = match self.inner.registry.get(pid) {
            Ok(record) => record.log_path,
            Err(_) => logs.retained_path(pid).ok_or(LogError::NotFound(pid))?,
        };
        let total_bytes = logs.retained_bytes(&path);
        let (mode, truncated) = match mode {
            LogMode::Full if total_bytes > self.inner.config.log_transfer_limit => {
                (LogMode::Tail { lines: DOWNGRADED_TAIL_LINES }, true)
            }
            other => (other, false),
        };
        let content = logs.read(&path, mode)?;
        Ok(LogChunk { pid, content, total_bytes, truncated })
    }

    async fn notify(&self, record: &ProcessRecord, kind: NotificationKind, log_retained_secs: Option<u64>) {
        let notification = Notification {
            owner: record.owner.clone(),
            pid: record.id,
            deployment: record.deployment.clone(),
            script_name: record.script_name.clone(),
            kind,
            at_ms: self.inner.clock.epoch_ms(),
            log_retained_secs,
        };
        if let Err(e) = self.inner.notifier.notify(&notification).await {
            tracing::warn!(pid = %record.id, owner = %record.owner, error = %e, "notification delivery failed");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod scenario_tests;
