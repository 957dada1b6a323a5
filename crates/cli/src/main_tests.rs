// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{CommandFactory, Parser};

use super::*;
use crate::commands::daemon::DaemonCommand;

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parse_deploy_with_manifest() {
    let cli = Cli::parse_from(["dw", "deploy", "job.py", "-r", "reqs.txt", "--name", "nightly"]);
    let Commands::Deploy(args) = cli.command else {
        panic!("expected Deploy");
    };
    assert_eq!(args.script, std::path::PathBuf::from("job.py"));
    assert_eq!(args.manifest, Some(std::path::PathBuf::from("reqs.txt")));
    assert_eq!(args.name.as_deref(), Some("nightly"));
    assert!(!args.wait_manifest);
}

#[test]
fn deploy_rejects_manifest_with_wait() {
    let result = Cli::try_parse_from(["dw", "deploy", "job.py", "-r", "reqs.txt", "--wait-manifest"]);
    assert!(result.is_err());
}

#[test]
fn parse_stop_pid() {
    let cli = Cli::parse_from(["dw", "stop", "4242"]);
    assert!(matches!(cli.command, Commands::Stop { pid: ProcessId(4242) }));
}

#[test]
fn stop_rejects_non_numeric_pid() {
    assert!(Cli::try_parse_from(["dw", "stop", "abc"]).is_err());
}

#[test]
fn output_flag_is_global() {
    let cli = Cli::parse_from(["dw", "ps", "-o", "json"]);
    assert_eq!(cli.output, OutputFormat::Json);
    assert!(matches!(cli.command, Commands::Ps));

    let cli = Cli::parse_from(["dw", "status"]);
    assert_eq!(cli.output, OutputFormat::Text);
}

#[test]
fn parse_shutdown_token() {
    let cli = Cli::parse_from(["dw", "shutdown", "--token", "s3cret"]);
    let Commands::Shutdown { token } = cli.command else {
        panic!("expected Shutdown");
    };
    assert_eq!(token.as_deref(), Some("s3cret"));
}

#[test]
fn parse_daemon_logs_limit() {
    let cli = Cli::parse_from(["dw", "daemon", "logs", "-n", "20"]);
    let Commands::Daemon(args) = cli.command else {
        panic!("expected Daemon");
    };
    assert!(matches!(args.command, DaemonCommand::Logs { limit: 20, no_limit: false }));
}

#[test]
fn parse_logs_full() {
    let cli = Cli::parse_from(["dw", "logs", "7", "--full"]);
    let Commands::Logs(args) = cli.command else {
        panic!("expected Logs");
    };
    assert_eq!(args.pid, ProcessId(7));
    assert!(args.full);
}
