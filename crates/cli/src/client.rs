// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket client for the `dwd` daemon.
//!
//! Every call opens a fresh connection and exchanges one framed request
//! and response.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dw_daemon::env::ipc_timeout;
use dw_daemon::LifecycleError;
use dw_wire::{self as wire, ErrorCode, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {})", .0.display())]
    NotRunning(PathBuf),

    #[error("cannot connect to daemon: {0}")]
    Connect(#[source] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("unexpected response from daemon: {0}")]
    Unexpected(String),

    #[error("could not start daemon: {0}")]
    StartFailed(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl ClientError {
    /// True when no daemon is listening (missing socket or a stale one).
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::NotRunning(_) => true,
            ClientError::Connect(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Client for the user-level daemon. Fails fast when no socket exists.
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = socket_path()?;
        if !socket_path.exists() {
            return Err(ClientError::NotRunning(socket_path));
        }
        Ok(Self { socket_path })
    }

    /// Client for an explicit socket.
    pub fn at(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, ipc_timeout()).await
    }

    pub async fn send_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(ClientError::Connect)?;
        let (mut reader, mut writer) = stream.into_split();
        wire::write_request(&mut writer, request, ipc_timeout()).await?;
        Ok(wire::read_response(&mut reader, timeout).await?)
    }

    /// Turn a response the caller did not expect into an error.
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { code, message } => Err(ClientError::Rejected { code, message }),
            other => Err(ClientError::Unexpected(format!("{other:?}"))),
        }
    }
}

/// `<state_dir>/daemon.sock`
pub fn socket_path() -> Result<PathBuf, ClientError> {
    Ok(dw_daemon::env::state_dir()?.join("daemon.sock"))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
