// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use dw_core::SystemClock;
use fs2::FileExt;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::info;

use crate::listener::ListenCtx;
use crate::notify::{DesktopNotifier, NotificationHub};
use crate::provision::VenvProvisioner;
use crate::supervisor::Supervisor;

use super::{Config, DaemonState, LifecycleError, StartupResult};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // The lock holder owns the existing socket and PID file
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. State directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Lock before touching anything else. Open without truncating so a
    //    failed attempt leaves the running daemon's PID in place.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Logs persist across restarts; scratch directories do not
    std::fs::create_dir_all(&config.logs_path)?;
    let wiped = wipe_dir(&config.work_path)?;
    if wiped > 0 {
        info!(wiped, "removed stale work directories");
    }

    // 4. Supervisor and listener context
    let mut hub = NotificationHub::new();
    if config.desktop_notify {
        hub = hub.with_desktop(DesktopNotifier::new());
    }
    let supervisor = Supervisor::new(
        config.supervisor.clone(),
        VenvProvisioner::new(config.provision.clone()),
        hub.clone(),
        SystemClock,
    );
    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx::new(
        supervisor.clone(),
        hub,
        Arc::clone(&shutdown),
        config.shutdown_token.as_deref(),
    ));
    if config.shutdown_token.is_none() {
        info!("no shutdown token configured, remote shutdown disabled");
    }

    // 5. Remove stale socket and bind last
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        state_dir = %config.state_dir.display(),
        max_processes = config.supervisor.max_processes,
        "daemon started"
    );

    Ok(StartupResult {
        daemon: DaemonState { config: config.clone(), lock_file, supervisor, ctx, shutdown },
        listener,
    })
}

/// Empty `dir`, creating it if needed. Returns the number of entries removed.
fn wipe_dir(dir: &Path) -> Result<usize, LifecycleError> {
    let mut removed = 0;
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                let path = entry?.path();
                if path.is_dir() {
                    std::fs::remove_dir_all(&path)?;
                } else {
                    std::fs::remove_file(&path)?;
                }
                removed += 1;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    std::fs::create_dir_all(dir)?;
    Ok(removed)
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
