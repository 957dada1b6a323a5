// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: defaults, then `config.toml`, then `DW_*` variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::env;
use crate::logs::LogLimits;
use crate::provision::ProvisionConfig;
use crate::supervisor::{SupervisorConfig, SyntaxCheck};

use super::LifecycleError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional settings read from `config.toml`. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub max_processes: Option<usize>,
    pub max_restarts: Option<u32>,
    pub monitor_interval_ms: Option<u64>,
    pub stop_grace_ms: Option<u64>,
    pub process_timeout_secs: Option<u64>,
    pub max_script_bytes: Option<u64>,
    pub python: Option<PathBuf>,
    pub use_venv: Option<bool>,
    pub auto_install_deps: Option<bool>,
    pub manifest_window_secs: Option<u64>,
    pub desktop_notify: Option<bool>,
    pub log_max_bytes: Option<u64>,
    pub log_backups: Option<usize>,
    pub log_transfer_limit: Option<u64>,
    pub log_retention_secs: Option<u64>,
}

impl FileConfig {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
    }

    /// Read `path`. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if required {
                    Err(ConfigError::Missing(path.to_owned()))
                } else {
                    Ok(Self::default())
                }
            }
            Err(source) => Err(ConfigError::Read { path: path.to_owned(), source }),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/dw)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Per-deployment logs
    pub logs_path: PathBuf,
    /// Per-deployment scratch directories, wiped at startup
    pub work_path: PathBuf,
    pub supervisor: SupervisorConfig,
    pub provision: ProvisionConfig,
    pub desktop_notify: bool,
    /// Token that authorizes a remote shutdown
    pub shutdown_token: Option<String>,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// The state directory comes from the environment. Settings are layered
    /// defaults < config file < environment. `DW_CONFIG` names a file that
    /// must exist; the fallback `<state_dir>/config.toml` is optional.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = std::path::absolute(env::state_dir()?)?;
        let file = match env::config_path() {
            Some(path) => FileConfig::load(&std::path::absolute(path)?, true)?,
            None => FileConfig::load(&state_dir.join("config.toml"), false)?,
        };
        Ok(Self::resolve(state_dir, file))
    }

    /// Build a config rooted at `state_dir` from file settings and the
    /// environment.
    pub fn resolve(state_dir: PathBuf, file: FileConfig) -> Self {
        let python = env::python().or(file.python).unwrap_or_else(|| PathBuf::from("python3"));
        let logs_path = state_dir.join("logs");
        let work_path = state_dir.join("work");

        let defaults = SupervisorConfig::default();
        let log_limits = LogLimits {
            max_bytes: env::log_max_bytes()
                .or(file.log_max_bytes)
                .unwrap_or(defaults.log_limits.max_bytes),
            backups: env::log_backups().or(file.log_backups).unwrap_or(defaults.log_limits.backups),
        };
        let process_timeout_secs = env::process_timeout()
            .map(|d| d.as_secs())
            .or(file.process_timeout_secs)
            .unwrap_or(0);

        let supervisor = SupervisorConfig::default()
            .work_dir(&work_path)
            .logs_dir(&logs_path)
            .max_processes(
                env::max_processes().or(file.max_processes).unwrap_or(defaults.max_processes),
            )
            .max_restarts(env::max_restarts().or(file.max_restarts).unwrap_or(defaults.max_restarts))
            .monitor_interval(
                env::monitor_interval()
                    .or(file.monitor_interval_ms.map(Duration::from_millis))
                    .unwrap_or(defaults.monitor_interval),
            )
            .stop_grace(
                env::stop_grace()
                    .or(file.stop_grace_ms.map(Duration::from_millis))
                    .unwrap_or(defaults.stop_grace),
            )
            .with_process_timeout_secs(process_timeout_secs)
            .max_script_bytes(
                env::max_script_bytes()
                    .or(file.max_script_bytes)
                    .unwrap_or(defaults.max_script_bytes),
            )
            .syntax_check(SyntaxCheck::python(&python))
            .log_limits(log_limits)
            .log_retention(
                env::log_retention()
                    .or(file.log_retention_secs.map(Duration::from_secs))
                    .unwrap_or(defaults.log_retention),
            )
            .log_transfer_limit(
                env::log_transfer_limit()
                    .or(file.log_transfer_limit)
                    .unwrap_or(defaults.log_transfer_limit),
            )
            .manifest_window(
                env::manifest_window()
                    .or(file.manifest_window_secs.map(Duration::from_secs))
                    .unwrap_or(defaults.manifest_window),
            );

        let provision = ProvisionConfig::default()
            .python(python)
            .use_venv(env::use_venv().or(file.use_venv).unwrap_or(true))
            .auto_install(env::auto_install_deps().or(file.auto_install_deps).unwrap_or(true));

        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            logs_path,
            work_path,
            supervisor,
            provision,
            desktop_notify: env::desktop_notify().or(file.desktop_notify).unwrap_or(false),
            shutdown_token: env::shutdown_token(),
            state_dir,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
