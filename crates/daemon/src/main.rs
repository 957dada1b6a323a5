// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dwd`: the Deploy Warden daemon.
//!
//! Binds the socket, prints `READY` on stdout, then serves requests until
//! SIGINT, SIGTERM, or an authorized `Shutdown` request.

use std::io::Write;
use std::path::Path;

use dw_daemon::lifecycle::{self, Config, StartupResult};
use dw_daemon::listener::Listener;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Marker line the CLI scans for when a background start fails.
const STARTUP_MARKER: &str = "--- dwd: starting";

fn main() -> std::process::ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dwd: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("dwd: cannot start runtime: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dwd: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), lifecycle::LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    write_startup_marker(&config.log_path)?;
    let _guard = init_logging(&config.log_path);

    let StartupResult { mut daemon, listener } = match lifecycle::startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to start daemon: {e}");
            append_startup_error(&config.log_path, &e);
            return Err(e);
        }
    };

    let listener_task = tokio::spawn(Listener::new(listener, daemon.ctx.clone()).run());
    let cancel = CancellationToken::new();
    let monitor = daemon.supervisor.spawn_monitor(cancel.clone());

    println!("READY");
    let _ = std::io::stdout().flush();

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = daemon.shutdown.notified() => info!("shutdown requested over socket"),
    }

    listener_task.abort();
    cancel.cancel();
    if let Err(e) = monitor.await {
        error!(error = %e, "monitor task failed");
    }
    daemon.shutdown().await;
    Ok(())
}

/// Log to `daemon.log` through a non-blocking writer. `RUST_LOG` overrides
/// the default `info` filter.
fn init_logging(log_path: &Path) -> Option<WorkerGuard> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(log_path).ok()?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Some(guard)
}

fn write_startup_marker(log_path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(file, "{STARTUP_MARKER} (pid: {}) ---\n", std::process::id())
}

/// Plain line the CLI can find even before the tracing writer flushes.
fn append_startup_error(log_path: &Path, e: &lifecycle::LifecycleError) {
    if let Ok(mut file) = std::fs::OpenOptions::new().append(true).open(log_path) {
        let _ = writeln!(file, "ERROR Failed to start daemon: {e}");
    }
}
