// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for requests that change daemon state.

use dw_core::{Clock, OwnerContext, ProcessId};
use dw_wire::{ErrorCode, Response};

use super::{digest, ListenCtx};
use crate::provision::{ProvisionError, Provisioner};
use crate::supervisor::{DeployError, DeployRequest};

pub(super) async fn handle_deploy<P: Provisioner, C: Clock>(
    ctx: &ListenCtx<P, C>,
    script_name: String,
    script: Vec<u8>,
    manifest: Option<String>,
    owner: OwnerContext,
    wait_for_manifest: bool,
) -> Response {
    let request = DeployRequest { script_name, script, manifest, owner, wait_for_manifest };
    match ctx.supervisor.deploy(request).await {
        Ok(outcome) => Response::Deployed { process: outcome.process, warnings: outcome.warnings },
        Err(e) => Response::error(error_code(&e), e.to_string()),
    }
}

pub(super) fn handle_manifest<P: Provisioner, C: Clock>(
    ctx: &ListenCtx<P, C>,
    owner: OwnerContext,
    content: String,
) -> Response {
    let packages = ctx.supervisor.stage_manifest(owner, content);
    Response::ManifestStaged { packages }
}

pub(super) async fn handle_stop<P: Provisioner, C: Clock>(
    ctx: &ListenCtx<P, C>,
    pid: ProcessId,
) -> Response {
    let was_live = ctx.supervisor.stop(pid).await;
    Response::Stopped { pid, was_live }
}

/// Accept a shutdown only when a token is configured and the caller's
/// matches it. Digests are compared so the comparison does not depend on
/// where the strings first differ.
pub(super) fn handle_shutdown<P: Provisioner, C: Clock>(
    ctx: &ListenCtx<P, C>,
    token: Option<&str>,
) -> Response {
    let authorized = match (&ctx.shutdown_digest, token) {
        (Some(expected), Some(provided)) => digest(provided) == *expected,
        _ => false,
    };
    if !authorized {
        tracing::warn!("rejected unauthorized shutdown");
        return Response::error(ErrorCode::Unauthorized, "unauthorized");
    }
    ctx.shutdown.notify_one();
    Response::ShuttingDown
}

pub(super) fn error_code(e: &DeployError) -> ErrorCode {
    match e {
        DeployError::Validation(_) => ErrorCode::Validation,
        DeployError::Provision(ProvisionError::Io(_)) => ErrorCode::Internal,
        DeployError::Provision(_) => ErrorCode::Provision,
        DeployError::Launch(_) => ErrorCode::Launch,
        DeployError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
        DeployError::DuplicateId(_) => ErrorCode::DuplicateId,
        DeployError::Log(_) => ErrorCode::Internal,
    }
}
