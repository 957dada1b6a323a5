// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Virtualenv creation and package installation through subprocesses.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::LazyLock;
use std::time::Duration;

use dw_core::EnvironmentHandle;
use regex::Regex;

use super::ProvisionError;

#[allow(clippy::expect_used)]
static FAILED_REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:No matching distribution found for|Could not find a version that satisfies the requirement|Invalid requirement:)\s+'?([^\s'(]+)",
    )
    .expect("constant regex pattern is valid")
});

/// Resolve a bare program name against `PATH`; other paths are made absolute.
pub fn resolve_program(program: &Path) -> PathBuf {
    if program.components().count() == 1 && !program.is_absolute() {
        if let Some(paths) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&paths) {
                let candidate = dir.join(program);
                if candidate.is_file() {
                    return candidate;
                }
            }
        }
        return program.to_path_buf();
    }
    std::path::absolute(program).unwrap_or_else(|_| program.to_path_buf())
}

/// Create a virtualenv at `root` and return its interpreter.
pub async fn create(python: &Path, root: &Path, timeout: Duration) -> Result<PathBuf, ProvisionError> {
    let root = std::path::absolute(root)?;
    let mut cmd = tokio::process::Command::new(python);
    cmd.arg("-m").arg("venv").arg(&root);
    let output = run_with_timeout(cmd, timeout, "venv creation").await?;
    if !output.status.success() {
        return Err(ProvisionError::EnvironmentFailed(last_line(&output.stderr)));
    }
    let interpreter = root.join("bin").join("python");
    if !interpreter.exists() {
        return Err(ProvisionError::EnvironmentFailed(format!(
            "{} missing after venv creation",
            interpreter.display()
        )));
    }
    Ok(interpreter)
}

/// Install `packages` with the environment's own pip. A shared interpreter
/// installs into the user site so the host installation is left alone.
pub async fn install(
    env: &EnvironmentHandle,
    packages: &[String],
    timeout: Duration,
) -> Result<(), ProvisionError> {
    let mut cmd = tokio::process::Command::new(&env.interpreter);
    cmd.args(["-m", "pip", "install", "--disable-pip-version-check", "--no-input"]);
    if !env.isolated {
        cmd.arg("--user");
    }
    cmd.args(packages);
    tracing::info!(interpreter = %env.interpreter.display(), ?packages, "installing packages");
    let output = run_with_timeout(cmd, timeout, "package install").await?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    Err(ProvisionError::InstallFailed { packages: failed_packages(&stderr, packages), output: stderr })
}

/// Packages pip reported as unresolvable, or all requested when none can be
/// identified.
pub fn failed_packages(stderr: &str, requested: &[String]) -> Vec<String> {
    let mut failed: Vec<String> = Vec::new();
    for caps in FAILED_REQUIREMENT.captures_iter(stderr) {
        if let Some(req) = caps.get(1) {
            let name = requirement_name(req.as_str());
            let matched = requested
                .iter()
                .find(|r| requirement_name(r).eq_ignore_ascii_case(name))
                .cloned()
                .unwrap_or_else(|| name.to_string());
            if !failed.contains(&matched) {
                failed.push(matched);
            }
        }
    }
    if failed.is_empty() {
        requested.to_vec()
    } else {
        failed
    }
}

/// Distribution name of a requirement line (`flask>=3` -> `flask`).
fn requirement_name(line: &str) -> &str {
    let end = line.find(|c: char| "<>=!~;[ (".contains(c)).unwrap_or(line.len());
    &line[..end]
}

/// Remove an environment root; a missing root is already released.
pub async fn release(root: &Path) -> Result<(), ProvisionError> {
    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn run_with_timeout(
    mut cmd: tokio::process::Command,
    timeout: Duration,
    label: &str,
) -> Result<Output, ProvisionError> {
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ProvisionError::Timeout { step: label.to_string(), after: timeout }),
    }
}

fn last_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("unknown error").trim().to_string()
}

#[cfg(test)]
#[path = "venv_tests.rs"]
mod tests;
