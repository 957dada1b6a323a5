// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use crate::logs::LogLimits;

/// Placeholder replaced by the script path in [`SyntaxCheck::args`].
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Command that checks a script parses without running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxCheck {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SyntaxCheck {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self { program: program.into(), args: args.iter().map(|a| a.to_string()).collect() }
    }

    /// `python -m py_compile <script>`
    pub fn python(interpreter: impl Into<PathBuf>) -> Self {
        Self::new(interpreter, &["-m", "py_compile", SCRIPT_PLACEHOLDER])
    }
}

/// Tunables for the supervisor core.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Live records allowed at once
    pub max_processes: usize,
    /// Automatic restarts per deployment
    pub max_restarts: u32,
    pub monitor_interval: Duration,
    /// Time between SIGTERM and SIGKILL
    pub stop_grace: Duration,
    /// Longest a child may run before it is force-stopped
    pub process_timeout: Option<Duration>,
    pub max_script_bytes: u64,
    pub syntax_check: Option<SyntaxCheck>,
    pub syntax_timeout: Duration,
    /// Parent of the per-deployment scratch directories
    pub work_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub log_limits: LogLimits,
    pub log_retention: Duration,
    /// Retained size above which a full log read is downgraded to a tail
    pub log_transfer_limit: u64,
    pub manifest_window: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_processes: 10,
            max_restarts: 3,
            monitor_interval: Duration::from_secs(5),
            stop_grace: Duration::from_secs(5),
            process_timeout: None,
            max_script_bytes: 1024 * 1024,
            syntax_check: Some(SyntaxCheck::python("python3")),
            syntax_timeout: Duration::from_secs(30),
            work_dir: PathBuf::from("work"),
            logs_dir: PathBuf::from("logs"),
            log_limits: LogLimits::default(),
            log_retention: Duration::from_secs(60),
            log_transfer_limit: 50 * 1024 * 1024,
            manifest_window: Duration::from_secs(10),
        }
    }
}

impl SupervisorConfig {
    dw_core::setters! {
        into {
            work_dir: PathBuf,
            logs_dir: PathBuf,
        }
        set {
            max_processes: usize,
            max_restarts: u32,
            monitor_interval: Duration,
            stop_grace: Duration,
            max_script_bytes: u64,
            syntax_timeout: Duration,
            log_limits: LogLimits,
            log_retention: Duration,
            log_transfer_limit: u64,
            manifest_window: Duration,
        }
        option {
            process_timeout: Duration,
            syntax_check: SyntaxCheck,
        }
    }

    pub fn without_syntax_check(mut self) -> Self {
        self.syntax_check = None;
        self
    }

    /// Zero means unlimited.
    pub fn with_process_timeout_secs(mut self, secs: u64) -> Self {
        self.process_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }
}
