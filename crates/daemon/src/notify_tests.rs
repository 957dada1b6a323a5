// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dw_core::{DeploymentId, NotificationKind, ProcessId};

fn note(owner: &str, pid: u32, kind: NotificationKind) -> Notification {
    Notification {
        owner: owner.into(),
        pid: ProcessId(pid),
        deployment: DeploymentId::from_string("dep-test"),
        script_name: "bot.py".into(),
        kind,
        at_ms: 1_000,
        log_retained_secs: None,
    }
}

#[tokio::test]
async fn hub_routes_by_owner() {
    let hub = NotificationHub::new();
    hub.notify(&note("alice", 1, NotificationKind::Started)).await.unwrap();
    hub.notify(&note("bob", 2, NotificationKind::Started)).await.unwrap();
    hub.notify(&note("alice", 1, NotificationKind::Stopped)).await.unwrap();

    let alice = hub.drain(&"alice".into());
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0].kind, NotificationKind::Started);
    assert_eq!(alice[1].kind, NotificationKind::Stopped);
    assert_eq!(hub.pending(&"bob".into()), 1);
}

#[tokio::test]
async fn drain_empties_inbox() {
    let hub = NotificationHub::new();
    hub.notify(&note("alice", 1, NotificationKind::Completed)).await.unwrap();
    assert_eq!(hub.drain(&"alice".into()).len(), 1);
    assert!(hub.drain(&"alice".into()).is_empty());
    assert!(hub.drain(&"nobody".into()).is_empty());
}

#[tokio::test]
async fn inbox_drops_oldest_past_capacity() {
    let hub = NotificationHub::new();
    for pid in 0..(INBOX_CAPACITY as u32 + 10) {
        hub.notify(&note("alice", pid, NotificationKind::Started)).await.unwrap();
    }
    let drained = hub.drain(&"alice".into());
    assert_eq!(drained.len(), INBOX_CAPACITY);
    assert_eq!(drained[0].pid, ProcessId(10));
}

#[tokio::test]
async fn clones_share_inboxes() {
    let hub = NotificationHub::new();
    let other = hub.clone();
    other.notify(&note("alice", 1, NotificationKind::Started)).await.unwrap();
    assert_eq!(hub.pending(&"alice".into()), 1);
}

#[tokio::test]
async fn fake_records_in_order() {
    let fake = FakeNotifier::new();
    fake.notify(&note("alice", 1, NotificationKind::Started)).await.unwrap();
    fake.notify(
        &note("alice", 1, NotificationKind::FailedPermanently { reason: "boom".into() }),
    )
    .await
    .unwrap();
    assert_eq!(fake.labels(), vec!["started", "failed"]);
    assert_eq!(fake.count(|k| matches!(k, NotificationKind::FailedPermanently { .. })), 1);
    assert_eq!(fake.for_pid(ProcessId(1)).len(), 2);
}
