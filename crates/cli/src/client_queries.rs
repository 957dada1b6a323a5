// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query and command methods for DaemonClient.

use dw_core::{Notification, OwnerContext, ProcessId, ProcessSummary};
use dw_wire::{LogChunk, LogMode, Query, Request, Response, StatusReport, PROTOCOL_VERSION};

use crate::client::{ClientError, DaemonClient};

/// A script ready to send to the daemon.
#[derive(Debug, Clone)]
pub struct DeploySubmission {
    pub script_name: String,
    pub script: Vec<u8>,
    pub manifest: Option<String>,
    pub owner: OwnerContext,
    pub wait_for_manifest: bool,
}

impl DaemonClient {
    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Daemon version via the Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: PROTOCOL_VERSION.to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<StatusReport, ClientError> {
        match self.send(&Request::Query { query: Query::Status }).await? {
            Response::Status { status } => Ok(status),
            other => Self::reject(other),
        }
    }

    pub async fn list_processes(&self) -> Result<Vec<ProcessSummary>, ClientError> {
        match self.send(&Request::Query { query: Query::ListProcesses }).await? {
            Response::Processes { processes } => Ok(processes),
            other => Self::reject(other),
        }
    }

    pub async fn logs(&self, pid: ProcessId, mode: LogMode) -> Result<LogChunk, ClientError> {
        match self.send(&Request::Query { query: Query::GetLogs { pid, mode } }).await? {
            Response::Logs { log } => Ok(log),
            other => Self::reject(other),
        }
    }

    /// Deploy a script. Uses the longer deploy timeout because the daemon
    /// may wait for a manifest and install packages before answering.
    pub async fn deploy(
        &self,
        submission: DeploySubmission,
    ) -> Result<(ProcessSummary, Vec<String>), ClientError> {
        let request = Request::Deploy {
            script_name: submission.script_name,
            script: submission.script,
            manifest: submission.manifest,
            owner: submission.owner,
            wait_for_manifest: submission.wait_for_manifest,
        };
        match self.send_with_timeout(&request, crate::env::deploy_timeout()).await? {
            Response::Deployed { process, warnings } => Ok((process, warnings)),
            other => Self::reject(other),
        }
    }

    /// Stage a manifest; returns the number of packages it names.
    pub async fn stage_manifest(
        &self,
        owner: OwnerContext,
        content: String,
    ) -> Result<usize, ClientError> {
        match self.send(&Request::Manifest { owner, content }).await? {
            Response::ManifestStaged { packages } => Ok(packages),
            other => Self::reject(other),
        }
    }

    /// Stop a process. Returns false when it was unknown or already finished.
    pub async fn stop(&self, pid: ProcessId) -> Result<bool, ClientError> {
        // Stopping waits out the grace period before SIGKILL
        let timeout = dw_daemon::env::ipc_timeout().max(std::time::Duration::from_secs(30));
        match self.send_with_timeout(&Request::Stop { pid }, timeout).await? {
            Response::Stopped { was_live, .. } => Ok(was_live),
            other => Self::reject(other),
        }
    }

    pub async fn notifications(
        &self,
        owner: OwnerContext,
    ) -> Result<Vec<Notification>, ClientError> {
        match self.send(&Request::Notifications { owner }).await? {
            Response::Notifications { notifications } => Ok(notifications),
            other => Self::reject(other),
        }
    }

    pub async fn shutdown(&self, token: Option<String>) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown { token }).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }
}
