// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-deploy interpreter environments.
//!
//! The package list comes from an explicit manifest when one is supplied,
//! otherwise from a best-effort scan of the script's imports. Each deploy
//! gets a fresh virtualenv; when the host cannot build one the shared
//! interpreter is used and the caller is warned.

mod discover;
mod manifest;
pub mod venv;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use discover::{discover_packages, is_stdlib};
pub use manifest::{parse_manifest, ManifestInbox};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvisioner, ProvisionCall};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dw_core::EnvironmentHandle;
use thiserror::Error;

/// Errors from provisioning an environment
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to install packages: {}", packages.join(", "))]
    InstallFailed { packages: Vec<String>, output: String },

    #[error("environment creation failed: {0}")]
    EnvironmentFailed(String),

    #[error("{step} timed out after {}s", after.as_secs())]
    Timeout { step: String, after: Duration },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inputs for one environment build.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub script: String,
    pub manifest: Option<String>,
    /// Where a private environment may be created; owned by the deploy
    pub root: PathBuf,
}

/// A ready environment plus anything the caller should be told about it.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub handle: EnvironmentHandle,
    pub warnings: Vec<String>,
}

/// Builds and releases interpreter environments.
#[async_trait]
pub trait Provisioner: Clone + Send + Sync + 'static {
    async fn provision(&self, req: ProvisionRequest) -> Result<Provisioned, ProvisionError>;

    /// Delete whatever `handle` owns on disk. Shared handles own nothing.
    async fn release(&self, handle: &EnvironmentHandle) -> Result<(), ProvisionError>;
}

#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub python: PathBuf,
    pub use_venv: bool,
    pub auto_install: bool,
    pub install_timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            use_venv: true,
            auto_install: true,
            install_timeout: Duration::from_secs(300),
        }
    }
}

impl ProvisionConfig {
    dw_core::setters! {
        into { python: PathBuf }
        set { use_venv: bool, auto_install: bool, install_timeout: Duration }
    }
}

/// Packages to install: an explicit manifest wins, then discovery (when
/// enabled), otherwise nothing.
pub fn resolve_packages(script: &str, manifest: Option<&str>, auto_install: bool) -> Vec<String> {
    match manifest {
        Some(text) => parse_manifest(text),
        None if auto_install => discover_packages(script),
        None => Vec::new(),
    }
}

/// Virtualenv-backed provisioner.
#[derive(Clone)]
pub struct VenvProvisioner {
    config: Arc<ProvisionConfig>,
}

impl VenvProvisioner {
    pub fn new(config: ProvisionConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }
}

#[async_trait]
impl Provisioner for VenvProvisioner {
    async fn provision(&self, req: ProvisionRequest) -> Result<Provisioned, ProvisionError> {
        let packages =
            resolve_packages(&req.script, req.manifest.as_deref(), self.config.auto_install);
        let python = venv::resolve_program(&self.config.python);
        let mut warnings = Vec::new();

        let handle = if self.config.use_venv {
            match venv::create(&python, &req.root, self.config.install_timeout).await {
                Ok(interpreter) => EnvironmentHandle::isolated(std::path::absolute(&req.root)?, interpreter),
                Err(e) => {
                    tracing::warn!(root = %req.root.display(), error = %e, "venv unavailable, using shared interpreter");
                    warnings.push(format!("running without isolation: {e}"));
                    let _ = venv::release(&req.root).await;
                    EnvironmentHandle::shared(&python)
                }
            }
        } else {
            warnings.push("running without isolation: virtualenvs disabled".to_string());
            EnvironmentHandle::shared(&python)
        };

        if !packages.is_empty() {
            if let Err(e) = venv::install(&handle, &packages, self.config.install_timeout).await {
                if let Err(release_err) = self.release(&handle).await {
                    tracing::warn!(error = %release_err, "failed to release environment");
                }
                return Err(e);
            }
        }

        Ok(Provisioned { handle: handle.with_packages(packages), warnings })
    }

    async fn release(&self, handle: &EnvironmentHandle) -> Result<(), ProvisionError> {
        match handle.root() {
            Some(root) if handle.isolated => venv::release(root).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
