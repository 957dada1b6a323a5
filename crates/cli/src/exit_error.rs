// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use dw_wire::ErrorCode;

use crate::client::ClientError;

/// The daemon refused the request (validation, provisioning, capacity)
pub const EXIT_REJECTED: i32 = 2;
/// No daemon is listening
pub const EXIT_NOT_RUNNING: i32 = 3;
/// The named process does not exist
pub const EXIT_NOT_FOUND: i32 = 4;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<ClientError> for ExitError {
    fn from(e: ClientError) -> Self {
        if e.is_not_running() {
            return Self::new(EXIT_NOT_RUNNING, "daemon not running (start it with `dw daemon start`)");
        }
        match e {
            ClientError::Rejected { code: ErrorCode::NotFound, message } => {
                Self::new(EXIT_NOT_FOUND, message)
            }
            ClientError::Rejected { code, message } => {
                Self::new(EXIT_REJECTED, format!("{}: {message}", label(code)))
            }
            other => Self::new(1, other.to_string()),
        }
    }
}

fn label(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Validation => "invalid script",
        ErrorCode::Provision => "environment setup failed",
        ErrorCode::Launch => "launch failed",
        ErrorCode::CapacityExceeded => "at capacity",
        ErrorCode::NotFound => "not found",
        ErrorCode::DuplicateId => "duplicate process id",
        ErrorCode::Unauthorized => "unauthorized",
        ErrorCode::Internal => "daemon error",
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
