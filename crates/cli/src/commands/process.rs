// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dw stop`, `dw status`, `dw ps`, `dw logs`

use anyhow::Result;
use clap::Args;
use dw_core::ProcessId;
use dw_wire::LogMode;

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, render_processes, OutputFormat};

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Process id shown by `dw ps`
    pub pid: ProcessId,

    /// Number of trailing lines to show
    #[arg(short = 'n', long, default_value = "100")]
    pub lines: usize,

    /// Show the whole log, including rotated generations
    #[arg(long, conflicts_with = "lines")]
    pub full: bool,
}

impl LogsArgs {
    pub fn mode(&self) -> LogMode {
        if self.full {
            LogMode::Full
        } else {
            LogMode::Tail { lines: self.lines }
        }
    }
}

fn connect() -> Result<DaemonClient, ExitError> {
    DaemonClient::connect().map_err(ExitError::from)
}

pub async fn stop(pid: ProcessId, format: OutputFormat) -> Result<()> {
    let was_live = connect()?.stop(pid).await.map_err(ExitError::from)?;
    let obj = serde_json::json!({ "pid": pid, "was_live": was_live });
    format_or_json(format, &obj, || {
        if was_live {
            println!("Stopped process {pid}");
        } else {
            println!("Process {pid} is not running");
        }
    })
}

pub async fn status(format: OutputFormat) -> Result<()> {
    let status = connect()?.status().await.map_err(ExitError::from)?;
    format_or_json(format, &status, || {
        println!(
            "{} live ({} running) of {} slots, up {}",
            status.total_live,
            status.running,
            status.capacity,
            dw_core::format_elapsed(status.uptime_secs)
        );
        if !status.processes.is_empty() {
            println!();
            render_processes(&status.processes, &mut std::io::stdout());
        }
    })
}

pub async fn ps(format: OutputFormat) -> Result<()> {
    let processes = connect()?.list_processes().await.map_err(ExitError::from)?;
    handle_list(format, &processes, "No processes running", |items, out| {
        render_processes(items, out)
    })
}

pub async fn logs(args: LogsArgs, format: OutputFormat) -> Result<()> {
    let chunk = connect()?.logs(args.pid, args.mode()).await.map_err(ExitError::from)?;
    format_or_json(format, &chunk, || {
        print!("{}", chunk.content);
        if !chunk.content.is_empty() && !chunk.content.ends_with('\n') {
            println!();
        }
        if chunk.truncated {
            eprintln!(
                "{}",
                crate::color::muted(&format!(
                    "log is {} bytes; showing the tail only",
                    chunk.total_bytes
                ))
            );
        }
    })
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
