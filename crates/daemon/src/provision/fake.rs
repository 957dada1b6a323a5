// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{resolve_packages, ProvisionError, ProvisionRequest, Provisioned, Provisioner};
use async_trait::async_trait;
use dw_core::EnvironmentHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded provisioner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionCall {
    Provision { root: PathBuf, packages: Vec<String> },
    Release { root: Option<PathBuf> },
}

struct FakeProvisionState {
    calls: Vec<ProvisionCall>,
    releases: HashMap<PathBuf, usize>,
}

/// Fake provisioner for testing.
///
/// Hands out environments for a fixed interpreter without installing
/// anything. Packages listed with [`FakeProvisioner::failing`] make the
/// install step fail the way pip would.
#[derive(Clone)]
pub struct FakeProvisioner {
    interpreter: PathBuf,
    isolated: bool,
    failing: Arc<Vec<String>>,
    inner: Arc<Mutex<FakeProvisionState>>,
}

impl FakeProvisioner {
    /// Isolated environments under each request's root.
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            isolated: true,
            failing: Arc::new(Vec::new()),
            inner: Arc::new(Mutex::new(FakeProvisionState {
                calls: Vec::new(),
                releases: HashMap::new(),
            })),
        }
    }

    /// Behave like a host without venv support.
    pub fn degraded(mut self) -> Self {
        self.isolated = false;
        self
    }

    pub fn failing<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = Arc::new(packages.into_iter().map(Into::into).collect());
        self
    }

    pub fn calls(&self) -> Vec<ProvisionCall> {
        self.inner.lock().calls.clone()
    }

    pub fn provision_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ProvisionCall::Provision { .. }))
            .count()
    }

    /// How many times the environment rooted at `root` was released.
    pub fn release_count(&self, root: &Path) -> usize {
        self.inner.lock().releases.get(root).copied().unwrap_or(0)
    }

    pub fn total_releases(&self) -> usize {
        self.inner.lock().releases.values().sum()
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    async fn provision(&self, req: ProvisionRequest) -> Result<Provisioned, ProvisionError> {
        let packages = resolve_packages(&req.script, req.manifest.as_deref(), true);
        self.inner
            .lock()
            .calls
            .push(ProvisionCall::Provision { root: req.root.clone(), packages: packages.clone() });

        let failed: Vec<String> =
            packages.iter().filter(|p| self.failing.contains(p)).cloned().collect();
        if !failed.is_empty() {
            return Err(ProvisionError::InstallFailed {
                output: format!("ERROR: No matching distribution found for {}", failed[0]),
                packages: failed,
            });
        }

        if !self.isolated {
            return Ok(Provisioned {
                handle: EnvironmentHandle::shared(&self.interpreter).with_packages(packages),
                warnings: vec!["running without isolation: venv unavailable".to_string()],
            });
        }

        tokio::fs::create_dir_all(&req.root).await?;
        Ok(Provisioned {
            handle: EnvironmentHandle::isolated(&req.root, &self.interpreter).with_packages(packages),
            warnings: Vec::new(),
        })
    }

    async fn release(&self, handle: &EnvironmentHandle) -> Result<(), ProvisionError> {
        let root = handle.root().map(Path::to_path_buf);
        {
            let mut state = self.inner.lock();
            state.calls.push(ProvisionCall::Release { root: root.clone() });
            if let Some(root) = &root {
                *state.releases.entry(root.clone()).or_default() += 1;
            }
        }
        if let Some(root) = root.filter(|_| handle.isolated) {
            super::venv::release(&root).await?;
        }
        Ok(())
    }
}
