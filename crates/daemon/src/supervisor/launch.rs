// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning children and pumping their output into the log sink.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use dw_core::{EnvironmentHandle, ProcessId};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::logs::LogSink;

/// Exact variable names never passed to children.
const BLOCKED_NAMES: &[&str] = &["BOT_TOKEN", "API_ID", "API_HASH", "SHUTDOWN_TOKEN"];

/// Prefixes never passed to children.
const BLOCKED_PREFIXES: &[&str] = &["DW_", "TELEGRAM_"];

/// Substrings marking a variable as a credential.
const SECRET_MARKERS: &[&str] =
    &["SECRET", "PASSWORD", "TOKEN", "CREDENTIAL", "PRIVATE_KEY", "API_KEY"];

/// A freshly spawned child and the tasks copying its output.
pub(crate) struct Launched {
    pub child: Child,
    pub pid: ProcessId,
    pub pumps: Vec<JoinHandle<()>>,
}

pub(crate) fn is_sensitive(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    BLOCKED_NAMES.contains(&upper.as_str())
        || BLOCKED_PREFIXES.iter().any(|p| upper.starts_with(p))
        || SECRET_MARKERS.iter().any(|m| upper.contains(m))
}

/// The daemon's environment minus anything sensitive, adjusted for `env`.
pub(crate) fn child_env(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
    env: &EnvironmentHandle,
) -> Vec<(OsString, OsString)> {
    let mut out: Vec<(OsString, OsString)> = vars
        .into_iter()
        .filter(|(k, _)| !is_sensitive(&k.to_string_lossy()))
        .filter(|(k, _)| k != "VIRTUAL_ENV" && k != "PYTHONUNBUFFERED")
        .collect();
    out.push(("PYTHONUNBUFFERED".into(), "1".into()));

    if let (Some(root), Some(bin)) = (env.root(), env.bin_dir()) {
        let path = out.iter().position(|(k, _)| k == "PATH").map(|i| out.remove(i).1);
        let mut dirs = vec![bin];
        if let Some(path) = &path {
            dirs.extend(std::env::split_paths(path));
        }
        match std::env::join_paths(dirs) {
            Ok(joined) => out.push(("PATH".into(), joined)),
            Err(e) => {
                tracing::warn!(error = %e, "cannot prepend environment to PATH");
                if let Some(path) = path {
                    out.push(("PATH".into(), path));
                }
            }
        }
        out.push(("VIRTUAL_ENV".into(), root.as_os_str().to_owned()));
    }
    out
}

/// Start `script` under the environment's interpreter in its own process
/// group, with output flowing into `sink`.
pub(crate) fn spawn(
    env: &EnvironmentHandle,
    script: &Path,
    work_dir: &Path,
    sink: &LogSink,
) -> std::io::Result<Launched> {
    let mut cmd = Command::new(&env.interpreter);
    cmd.arg(script)
        .current_dir(work_dir)
        .env_clear()
        .envs(child_env(std::env::vars_os(), env))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let Some(raw) = child.id() else {
        return Err(std::io::Error::other("child exited before its pid was read"));
    };

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(pump(stdout, sink.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(pump(stderr, sink.clone()));
    }
    Ok(Launched { child, pid: ProcessId(raw), pumps })
}

fn pump<R>(mut reader: R, sink: LogSink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8192];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = sink.write(&buf[..n]) {
                        tracing::warn!(path = %sink.path().display(), error = %e, "log write failed");
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "output pipe closed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
