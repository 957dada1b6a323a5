// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

mod config;
mod startup;

pub use config::{Config, ConfigError, FileConfig};
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use dw_core::SystemClock;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::listener::ListenCtx;
use crate::notify::NotificationHub;
use crate::provision::VenvProvisioner;
use crate::supervisor::Supervisor;

/// Supervisor with the production provisioner, notifier, and clock
pub type DaemonSupervisor = Supervisor<VenvProvisioner, NotificationHub, SystemClock>;

/// Listener context for [`DaemonSupervisor`]
pub type DaemonCtx = ListenCtx<VenvProvisioner, SystemClock>;

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a
/// Listener task.
pub struct DaemonState {
    pub config: Config,
    // Held to keep the exclusive lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub supervisor: DaemonSupervisor,
    pub ctx: Arc<DaemonCtx>,
    /// Signalled by an authorized `Shutdown` request
    pub shutdown: Arc<Notify>,
}

/// Result of daemon startup: the daemon state and the bound socket.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl DaemonState {
    /// Stop every supervised process, then remove the socket and PID file.
    pub async fn shutdown(&mut self) {
        info!("shutting down daemon");
        self.supervisor.shutdown_all().await;

        for path in [&self.config.socket_path, &self.config.lock_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove daemon file");
                }
            }
        }
        info!("daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
