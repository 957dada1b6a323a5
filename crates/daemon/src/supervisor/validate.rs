// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checks run before anything is provisioned or launched.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use super::config::{SyntaxCheck, SupervisorConfig, SCRIPT_PLACEHOLDER};
use super::error::DeployError;

const MAX_NAME_LEN: usize = 255;

/// Validate the submitted name and bytes; returns the script text.
pub(crate) fn check_script(
    config: &SupervisorConfig,
    script_name: &str,
    script: &[u8],
) -> Result<String, DeployError> {
    check_name(script_name)?;
    if script.is_empty() {
        return Err(DeployError::Validation("script is empty".to_string()));
    }
    if script.len() as u64 > config.max_script_bytes {
        return Err(DeployError::Validation(format!(
            "script is {} bytes, limit is {}",
            script.len(),
            config.max_script_bytes
        )));
    }
    String::from_utf8(script.to_vec())
        .map_err(|_| DeployError::Validation("script is not valid UTF-8".to_string()))
}

/// A script name must be a plain file name: no directories, no traversal.
pub(crate) fn check_name(name: &str) -> Result<(), DeployError> {
    let invalid = |why: &str| Err(DeployError::Validation(format!("script name {name:?} {why}")));
    if name.is_empty() {
        return invalid("is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return invalid("is too long");
    }
    if name == "." || name == ".." || name.starts_with('.') {
        return invalid("must not start with '.'");
    }
    if name.contains(['/', '\\', '\0']) {
        return invalid("must be a plain file name");
    }
    Ok(())
}

/// Run the configured syntax checker against the written script.
///
/// A checker that cannot be started is skipped with a warning; a checker
/// that rejects the script fails the deploy with its diagnostics.
pub(crate) async fn check_syntax(
    check: &SyntaxCheck,
    script_path: &Path,
    timeout: Duration,
) -> Result<(), DeployError> {
    let script = script_path.to_string_lossy();
    let args: Vec<String> =
        check.args.iter().map(|a| a.replace(SCRIPT_PLACEHOLDER, &script)).collect();
    let mut cmd = tokio::process::Command::new(&check.program);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = script_path.parent() {
        cmd.current_dir(dir);
    }

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!(program = %check.program.display(), error = %e, "syntax checker unavailable, skipping");
            return Ok(());
        }
        Err(_) => {
            return Err(DeployError::Validation(format!(
                "syntax check timed out after {}s",
                timeout.as_secs()
            )))
        }
    };
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
    Err(DeployError::Validation(format!("syntax error: {detail}")))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
