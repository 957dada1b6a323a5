// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dw daemon` and `dw shutdown`

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::client::DaemonClient;
use crate::client_lifecycle::{connect_or_start, daemon_log_path, daemon_stop, find_dwd_binary};
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args, Debug)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Start dwd in the background (or attached with --foreground)
    Start {
        /// Stay attached; dwd logs to daemon.log and exits on Ctrl-C
        #[arg(long)]
        foreground: bool,
    },
    /// Stop every process, then the daemon
    Stop,
    /// Stop the daemon if it is running, then start it again
    Restart,
    /// Report whether dwd is running and its capacity
    Status,
    /// Print the tail of daemon.log
    Logs {
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
        /// Print the whole file
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
}

/// JSON shape of `dw daemon status`.
#[derive(Debug, Serialize)]
struct DaemonStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uptime_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    live: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capacity: Option<usize>,
}

impl DaemonStatus {
    fn not_running() -> Self {
        Self { status: "not_running", version: None, uptime_secs: None, live: None, capacity: None }
    }
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground: true } => run_foreground(),
        DaemonCommand::Start { foreground: false } => start().await,
        DaemonCommand::Stop => stop(None).await,
        DaemonCommand::Restart => restart().await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Logs { limit, no_limit } => {
            logs(if no_limit { None } else { Some(limit) }, format)
        }
    }
}

fn run_foreground() -> Result<()> {
    let binary = find_dwd_binary();
    let status = std::process::Command::new(&binary).status()?;
    if !status.success() {
        bail!("{} exited with {}", binary.display(), status);
    }
    Ok(())
}

async fn start() -> Result<()> {
    let running = match DaemonClient::connect() {
        Ok(client) => client.status().await.ok(),
        Err(_) => None,
    };
    if let Some(report) = running {
        println!("dwd already running (up {})", dw_core::format_elapsed(report.uptime_secs));
        return Ok(());
    }
    connect_or_start().await.map_err(ExitError::from)?;
    println!("dwd started");
    Ok(())
}

/// Shut the daemon down; `token` falls back to `DW_SHUTDOWN_TOKEN`.
pub async fn stop(token: Option<String>) -> Result<()> {
    let token = token.or_else(dw_daemon::env::shutdown_token);
    let was_running = daemon_stop(token).await.map_err(ExitError::from)?;
    println!("{}", if was_running { "dwd stopped" } else { "dwd not running" });
    Ok(())
}

async fn restart() -> Result<()> {
    if daemon_stop(dw_daemon::env::shutdown_token()).await.map_err(ExitError::from)? {
        // Socket removal precedes process exit by a moment
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    connect_or_start().await.map_err(ExitError::from)?;
    println!("dwd restarted");
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let Ok(client) = DaemonClient::connect() else {
        return print_status(format, DaemonStatus::not_running());
    };
    let report = match client.status().await {
        Ok(report) => report,
        Err(e) if e.is_not_running() => return print_status(format, DaemonStatus::not_running()),
        Err(e) => return Err(ExitError::from(e).into()),
    };
    let version = client.hello().await.ok();
    print_status(
        format,
        DaemonStatus {
            status: "running",
            version,
            uptime_secs: Some(report.uptime_secs),
            live: Some(report.total_live),
            capacity: Some(report.capacity),
        },
    )
}

fn print_status(format: OutputFormat, status: DaemonStatus) -> Result<()> {
    format_or_json(format, &status, || {
        let (Some(uptime), Some(live), Some(capacity)) =
            (status.uptime_secs, status.live, status.capacity)
        else {
            println!("dwd not running");
            return;
        };
        println!("dwd running");
        println!("  protocol:  {}", status.version.as_deref().unwrap_or("unknown"));
        println!("  uptime:    {}", dw_core::format_elapsed(uptime));
        println!("  processes: {live} of {capacity}");
    })
}

fn logs(limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let path = daemon_log_path().map_err(ExitError::from)?;
    let content = read_daemon_log(&path, limit)?;
    let lines: Vec<&str> = content.lines().collect();
    let obj = serde_json::json!({ "log_path": path.display().to_string(), "lines": lines });
    format_or_json(format, &obj, || {
        if path.exists() {
            println!("{content}");
        } else {
            eprintln!("no daemon log at {}", path.display());
        }
    })
}

/// `None` reads the whole file. A missing log reads as empty.
fn read_daemon_log(path: &Path, limit: Option<usize>) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    let text = match limit {
        Some(n) => dw_daemon::logs::read_tail(path, 0, n)?,
        None => dw_daemon::logs::read_full(path, 0)?,
    };
    Ok(text)
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
