// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dw`: command-line client for the Deploy Warden daemon

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_lifecycle;
mod client_queries;
mod color;
mod commands;
mod env;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dw_core::ProcessId;

use commands::{daemon, deploy, notifications, process};
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dw", version, about = "Deploy Warden - supervise deployed scripts")]
#[command(styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, provision, and launch a script
    Deploy(deploy::DeployArgs),
    /// Stage a requirements manifest for the next deployment
    Manifest(deploy::ManifestArgs),
    /// Stop a running process
    Stop {
        /// Process id shown by `dw ps`
        pid: ProcessId,
    },
    /// Show capacity and live processes
    Status,
    /// List supervised processes
    Ps,
    /// Show a process's captured output
    Logs(process::LogsArgs),
    /// Drain lifecycle notifications
    Notifications(notifications::NotificationsArgs),
    /// Stop every process and shut the daemon down
    Shutdown {
        /// Shutdown token (default: $DW_SHUTDOWN_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("error: {}", exit.message);
                }
                exit.code
            }
            None => {
                eprintln!("error: {:#}", e);
                1
            }
        },
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let format = cli.output;
    match cli.command {
        Commands::Deploy(args) => deploy::deploy(args, format).await,
        Commands::Manifest(args) => deploy::manifest(args, format).await,
        Commands::Stop { pid } => process::stop(pid, format).await,
        Commands::Status => process::status(format).await,
        Commands::Ps => process::ps(format).await,
        Commands::Logs(args) => process::logs(args, format).await,
        Commands::Notifications(args) => notifications::notifications(args, format).await,
        Commands::Shutdown { token } => daemon::stop(token).await,
        Commands::Daemon(args) => daemon::daemon(args, format).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
