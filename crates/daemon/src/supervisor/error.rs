// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dw_core::ProcessId;
use thiserror::Error;

use crate::logs::LogError;
use crate::provision::ProvisionError;
use crate::registry::RegistryError;

/// Why a deploy was refused. Nothing it created survives the error.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid script: {0}")]
    Validation(String),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("launch failed: {0}")]
    Launch(String),

    #[error("capacity exceeded: {live} of {max} processes running")]
    CapacityExceeded { live: usize, max: usize },

    #[error("process id {0} is already registered")]
    DuplicateId(ProcessId),

    #[error(transparent)]
    Log(#[from] LogError),
}

impl From<RegistryError> for DeployError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::CapacityExceeded { live, max } => DeployError::CapacityExceeded { live, max },
            RegistryError::DuplicateId(id) => DeployError::DuplicateId(id),
            RegistryError::NotFound(id) => DeployError::Launch(format!("process {id} vanished during launch")),
        }
    }
}
