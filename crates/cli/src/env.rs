// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the CLI. Daemon-wide settings (state
//! directory, IPC timeout, shutdown token) come from `dw_daemon::env`.

use std::path::PathBuf;
use std::time::Duration;

use dw_core::OwnerContext;

/// Owner for deploys and notification polls: `DW_OWNER` > `USER` > "local".
pub fn owner() -> OwnerContext {
    let name = non_empty("DW_OWNER").or_else(|| non_empty("USER")).unwrap_or_else(|| "local".into());
    OwnerContext::new(name)
}

/// Client timeout for deploys, which may wait on a manifest and a pip
/// install. `DW_DEPLOY_TIMEOUT_SECS`, default 10 minutes.
pub fn deploy_timeout() -> Duration {
    non_empty("DW_DEPLOY_TIMEOUT_SECS")
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(600))
}

/// Explicit `dwd` binary (`DW_DAEMON_BINARY`)
pub fn daemon_binary() -> Option<PathBuf> {
    non_empty("DW_DAEMON_BINARY").map(PathBuf::from)
}

pub fn cargo_manifest_dir() -> Option<String> {
    non_empty("CARGO_MANIFEST_DIR")
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
