// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

use dw_wire::{Request, Response};

#[tokio::test]
async fn shutdown_removes_socket_and_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::resolve(dir.path().to_path_buf(), FileConfig::default());
    let StartupResult { mut daemon, listener } = startup(&config).await.unwrap();
    drop(listener);

    daemon.shutdown().await;

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn lock_is_released_when_daemon_state_drops() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::resolve(dir.path().to_path_buf(), FileConfig::default());

    let first = startup(&config).await.unwrap();
    assert!(matches!(startup(&config).await, Err(LifecycleError::LockFailed(_))));
    drop(first);

    let second = startup(&config).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn context_answers_over_bound_socket() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::resolve(dir.path().to_path_buf(), FileConfig::default());
    let StartupResult { daemon, listener } = startup(&config).await.unwrap();
    let server = tokio::spawn(crate::listener::Listener::new(listener, daemon.ctx.clone()).run());

    let stream = tokio::net::UnixStream::connect(&config.socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    dw_wire::write_request(&mut writer, &Request::Ping, Duration::from_secs(1)).await.unwrap();
    let response = dw_wire::read_response(&mut reader, Duration::from_secs(1)).await.unwrap();
    assert_eq!(response, Response::Pong);
    server.abort();
}
