// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Accepts connections on the daemon's Unix socket and serves one framed
//! request per connection. Each connection runs in its own task so a slow
//! deploy never blocks status queries.

mod mutations;
mod query;

use std::sync::Arc;

use dw_core::Clock;
use dw_wire::{self as wire, ProtocolError, Request, Response, PROTOCOL_VERSION};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::env::ipc_timeout;
use crate::notify::NotificationHub;
use crate::provision::Provisioner;
use crate::supervisor::Supervisor;

/// Shared daemon context for all request handlers.
pub struct ListenCtx<P, C> {
    pub supervisor: Supervisor<P, NotificationHub, C>,
    pub hub: NotificationHub,
    pub shutdown: Arc<Notify>,
    /// SHA-256 of the configured shutdown token; `None` disables shutdown
    /// over the socket.
    shutdown_digest: Option<[u8; 32]>,
}

impl<P, C> ListenCtx<P, C> {
    pub fn new(
        supervisor: Supervisor<P, NotificationHub, C>,
        hub: NotificationHub,
        shutdown: Arc<Notify>,
        shutdown_token: Option<&str>,
    ) -> Self {
        Self {
            supervisor,
            hub,
            shutdown,
            shutdown_digest: shutdown_token.map(digest),
        }
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Listener task for accepting socket connections.
pub struct Listener<P, C> {
    unix: UnixListener,
    ctx: Arc<ListenCtx<P, C>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("handler failed: {0}")]
    Internal(String),
}

impl<P: Provisioner, C: Clock> Listener<P, C> {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx<P, C>>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept failed"),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("connection timeout"),
        _ => error!(error = %e, "connection error"),
    }
}

/// Log a request without payloads or secrets.
fn log_request(request: &Request) {
    match request {
        Request::Query { query } => debug!(?query, "received query"),
        Request::Ping | Request::Hello { .. } => debug!(request = ?request, "received request"),
        Request::Deploy { script_name, script, owner, manifest, wait_for_manifest } => info!(
            %script_name,
            bytes = script.len(),
            %owner,
            manifest = manifest.is_some(),
            wait_for_manifest,
            "received deploy"
        ),
        Request::Manifest { owner, content } => {
            info!(%owner, bytes = content.len(), "received manifest")
        }
        Request::Stop { pid } => info!(%pid, "received stop"),
        Request::Notifications { owner } => debug!(%owner, "received notifications poll"),
        Request::Shutdown { token } => info!(token = token.is_some(), "received shutdown"),
    }
}

/// Handle a single client connection.
///
/// Read-only requests race the client disconnect and are dropped when it
/// goes away. Mutations run in their own task and always finish, so a
/// client timing out mid-deploy cannot leave a half-launched process.
pub async fn handle_connection<R, W, P, C>(
    mut reader: R,
    mut writer: W,
    ctx: Arc<ListenCtx<P, C>>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    P: Provisioner,
    C: Clock,
{
    let request = wire::read_request(&mut reader, ipc_timeout()).await?;
    log_request(&request);

    let response = if request.is_read_only() {
        tokio::select! {
            response = handle_request(request, &ctx) => response,
            _ = detect_client_disconnect(&mut reader) => {
                debug!("client disconnected, dropping query");
                return Ok(());
            }
        }
    } else {
        let task_ctx = Arc::clone(&ctx);
        let handler = tokio::spawn(async move { handle_request(request, &task_ctx).await });
        handler.await.map_err(|e| ConnectionError::Internal(e.to_string()))?
    };

    wire::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Resolves when the client closes its end (or sends unexpected bytes).
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
pub async fn handle_request<P: Provisioner, C: Clock>(
    request: Request,
    ctx: &ListenCtx<P, C>,
) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::Query { query } => query::handle_query(ctx, query),

        Request::Deploy { script_name, script, manifest, owner, wait_for_manifest } => {
            mutations::handle_deploy(ctx, script_name, script, manifest, owner, wait_for_manifest)
                .await
        }

        Request::Manifest { owner, content } => mutations::handle_manifest(ctx, owner, content),

        Request::Stop { pid } => mutations::handle_stop(ctx, pid).await,

        Request::Notifications { owner } => {
            Response::Notifications { notifications: ctx.hub.drain(&owner) }
        }

        Request::Shutdown { token } => mutations::handle_shutdown(ctx, token.as_deref()),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
