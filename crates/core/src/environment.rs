// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interpreter environment a deployment runs in

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Interpreter plus installed packages prepared for one deployment.
///
/// An isolated handle owns `root` exclusively and it is deleted when the
/// deployment is cleaned up. A shared handle (`isolated == false`) points at
/// the host interpreter and owns nothing on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentHandle {
    /// Absolute path to the interpreter executable
    pub interpreter: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub packages: Vec<String>,
    pub isolated: bool,
}

impl EnvironmentHandle {
    /// Handle for a private environment rooted at `root`.
    pub fn isolated(root: impl Into<PathBuf>, interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            root: Some(root.into()),
            packages: Vec::new(),
            isolated: true,
        }
    }

    /// Handle for the shared host interpreter.
    pub fn shared(interpreter: impl Into<PathBuf>) -> Self {
        Self { interpreter: interpreter.into(), root: None, packages: Vec::new(), isolated: false }
    }

    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    /// Directory holding the environment's executables, when it has one.
    pub fn bin_dir(&self) -> Option<PathBuf> {
        self.root.as_deref().map(|root| root.join("bin"))
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}
