// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end lifecycles with real `sh` children.

use super::signal::group_alive;
use super::tests::Harness;
use super::*;
use crate::provision::{FakeProvisioner, ProvisionError};
use dw_core::{ChildExit, ExitDecision};
use std::time::Duration;

fn is_failed(kind: &NotificationKind) -> bool {
    matches!(kind, NotificationKind::FailedPermanently { .. })
}

fn is_restarted(kind: &NotificationKind) -> bool {
    matches!(kind, NotificationKind::Restarted { .. })
}

#[tokio::test]
async fn clean_exit_completes_and_cleans_up() {
    let h = Harness::new();
    let outcome = h.deploy("echo done\nexit 0\n").await.unwrap();
    assert_eq!(outcome.process.state, ProcessState::Running);
    assert!(outcome.process.isolated);
    assert!(outcome.warnings.is_empty());
    let pid = outcome.process.id;

    assert!(h.tick_until(|s| s.registry().is_empty()).await);
    assert_eq!(h.notifier.labels(), vec!["started", "completed"]);
    assert_eq!(h.provisioner.total_releases(), 1);
    assert_eq!(h.work_entries(), 0);

    let completed = h.notifier.all().pop().unwrap();
    assert_eq!(completed.pid, pid);
    assert_eq!(completed.log_retained_secs, Some(60));
    let log = h.sup.fetch_log(pid, LogMode::Full).unwrap();
    assert!(log.content.contains("done"), "{}", log.content);
}

#[tokio::test]
async fn always_failing_script_restarts_three_times_then_gives_up() {
    let h = Harness::new();
    h.deploy("echo attempt\nexit 3\n").await.unwrap();

    assert!(h.tick_until(|s| s.registry().is_empty()).await);
    assert_eq!(h.notifier.count(|k| *k == NotificationKind::Started), 1);
    assert_eq!(h.notifier.count(is_restarted), 3);
    assert_eq!(h.notifier.count(is_failed), 1);
    assert_eq!(h.provisioner.total_releases(), 1);

    let last = h.notifier.all().pop().unwrap();
    assert_eq!(
        last.kind,
        NotificationKind::FailedPermanently { reason: ChildExit::Code(3).describe() }
    );

    // four launches wrote into the same log
    let log = h.sup.fetch_log(last.pid, LogMode::Full).unwrap().content;
    assert_eq!(log.matches("attempt").count(), 4, "{log}");
    assert!(log.contains("=== restart #3"), "{log}");
    assert!(!log.contains("=== restart #4"), "{log}");
}

#[tokio::test]
async fn restart_notifications_count_up() {
    let h = Harness::with(|c| c.max_restarts(2));
    h.deploy("exit 1\n").await.unwrap();
    assert!(h.tick_until(|s| s.registry().is_empty()).await);

    let attempts: Vec<(u32, u32)> = h
        .notifier
        .all()
        .into_iter()
        .filter_map(|n| match n.kind {
            NotificationKind::Restarted { attempt, max_restarts } => Some((attempt, max_restarts)),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let h = Harness::new();
    let pid = h.deploy("sleep 30\n").await.unwrap().process.id;

    assert!(h.sup.stop(pid).await);
    assert!(!h.sup.stop(pid).await);
    assert!(!h.sup.stop(ProcessId(u32::MAX)).await);

    assert!(h.sup.registry().is_empty());
    assert_eq!(h.notifier.labels(), vec!["started", "stopped"]);
    assert_eq!(h.provisioner.total_releases(), 1);
    assert_eq!(h.work_entries(), 0);
}

#[tokio::test]
async fn stop_escalates_to_sigkill() {
    let h = Harness::with(|c| c.stop_grace(Duration::from_millis(200)));
    let pid = h.deploy("trap '' TERM\nwhile true; do sleep 1; done\n").await.unwrap().process.id;
    // let the trap install
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stopped = tokio::time::timeout(Duration::from_secs(10), h.sup.stop(pid)).await.unwrap();
    assert!(stopped);
    assert!(h.sup.registry().is_empty());
}

#[tokio::test]
async fn stop_during_restart_cancels_relaunch() {
    let h = Harness::new();
    let pid = h.deploy("exit 1\n").await.unwrap().process.id;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // The monitor observed the failure and is about to relaunch
    let decision = h.sup.registry().update(pid, |r| r.on_exit(ChildExit::Code(1))).unwrap();
    assert_eq!(decision, ExitDecision::Restart { attempt: 1 });

    let sup = h.sup.clone();
    let stop = tokio::spawn(async move { sup.stop(pid).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.sup.registry().get(pid).unwrap().state, ProcessState::Terminated);

    h.sup.restart(pid, 1).await;
    assert!(tokio::time::timeout(Duration::from_secs(10), stop).await.unwrap().unwrap());

    assert!(h.sup.registry().is_empty());
    assert_eq!(h.notifier.labels(), vec!["started", "stopped"]);
    assert_eq!(h.provisioner.total_releases(), 1);
}

#[tokio::test]
async fn racing_stop_and_monitor_release_once() {
    let h = Harness::new();
    let pid = h.deploy("exit 0\n").await.unwrap().process.id;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let (_, a, b) = tokio::join!(h.sup.tick(), h.sup.stop(pid), h.sup.stop(pid));
    assert!(!(a && b));
    assert!(h.tick_until(|s| s.registry().is_empty()).await);

    assert_eq!(h.provisioner.total_releases(), 1);
    let terminal = h.notifier.count(|k| {
        matches!(k, NotificationKind::Completed | NotificationKind::Stopped)
    });
    assert_eq!(terminal, 1);
}

#[tokio::test]
async fn missing_package_fails_deploy_without_record() {
    let h = Harness::with_provisioner(FakeProvisioner::new("sh").failing(["nopenope-pkg"]), |c| c);
    let mut req = h.request("sleep 30\n");
    req.manifest = Some("requests\nnopenope-pkg\n".into());

    let err = h.sup.deploy(req).await.unwrap_err();
    match err {
        DeployError::Provision(ProvisionError::InstallFailed { packages, .. }) => {
            assert_eq!(packages, vec!["nopenope-pkg"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(h.sup.registry().is_empty());
    assert_eq!(h.work_entries(), 0);
    assert_eq!(h.log_files(), 0);
    assert!(h.notifier.all().is_empty());
}

#[tokio::test]
async fn launch_failure_releases_environment() {
    let h = Harness::with_provisioner(FakeProvisioner::new("/nonexistent/python3"), |c| c);
    let err = h.deploy("echo hi\n").await.unwrap_err();
    assert!(matches!(err, DeployError::Launch(_)), "{err}");
    assert_eq!(h.provisioner.total_releases(), 1);
    assert_eq!(h.work_entries(), 0);
    assert_eq!(h.log_files(), 0);
    assert!(h.sup.registry().is_empty());
}

#[tokio::test]
async fn capacity_is_enforced_at_deploy() {
    let h = Harness::with(|c| c.max_processes(1));
    let first = h.deploy("sleep 30\n").await.unwrap();
    let err = h.deploy("sleep 30\n").await.unwrap_err();
    assert!(matches!(err, DeployError::CapacityExceeded { live: 1, max: 1 }), "{err}");
    assert_eq!(h.sup.registry().len(), 1);
    assert_eq!(h.work_entries(), 1);
    h.sup.stop(first.process.id).await;
}

#[tokio::test]
async fn degraded_environment_is_reported() {
    let h = Harness::with_provisioner(FakeProvisioner::new("sh").degraded(), |c| c);
    let outcome = h.deploy("sleep 30\n").await.unwrap();
    assert!(!outcome.process.isolated);
    assert_eq!(outcome.warnings.len(), 1);
    h.sup.stop(outcome.process.id).await;
}

#[tokio::test]
async fn status_counts_running_children() {
    let h = Harness::new();
    h.deploy("sleep 30\n").await.unwrap();
    h.deploy("sleep 30\n").await.unwrap();
    h.clock.advance(Duration::from_secs(42));

    let status = h.sup.status();
    assert_eq!(status.total_live, 2);
    assert_eq!(status.running, 2);
    assert!(status.processes.iter().all(|p| p.runtime_secs == 42));

    h.sup.shutdown_all().await;
    assert!(h.sup.registry().is_empty());
    assert_eq!(h.notifier.count(|k| *k == NotificationKind::Stopped), 2);
}

#[tokio::test]
async fn maximum_runtime_is_enforced() {
    let h = Harness::with(|c| c.with_process_timeout_secs(60));
    let pid = h.deploy("sleep 30\n").await.unwrap().process.id;

    h.sup.tick().await;
    assert!(h.sup.registry().get(pid).is_ok());

    h.clock.advance(Duration::from_secs(61));
    h.sup.tick().await;
    h.sup.settle().await;
    assert!(h.sup.registry().is_empty());
    let last = h.notifier.all().pop().unwrap();
    assert_eq!(
        last.kind,
        NotificationKind::FailedPermanently { reason: monitor::RUNTIME_EXCEEDED.to_string() }
    );
}

#[tokio::test]
async fn hung_expiry_does_not_delay_other_exits() {
    let h = Harness::with(|c| c.with_process_timeout_secs(60).stop_grace(Duration::from_secs(3)));
    let hung = h.deploy("trap '' TERM\nwhile true; do sleep 1; done\n").await.unwrap().process.id;
    tokio::time::sleep(Duration::from_millis(200)).await;

    h.clock.advance(Duration::from_secs(61));
    let quick = h.deploy("sleep 0.3\nexit 0\n").await.unwrap().process.id;
    let started = std::time::Instant::now();

    // The hung child sits out its 3s grace period meanwhile
    while h.sup.registry().get(quick).is_ok() {
        assert!(started.elapsed() < Duration::from_secs(10));
        h.sup.tick().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(h.sup.registry().get(hung).unwrap().state, ProcessState::Terminated);

    h.sup.settle().await;
    assert!(h.sup.registry().is_empty());
    assert_eq!(h.notifier.count(|k| *k == NotificationKind::Completed), 1);
    assert_eq!(h.notifier.count(is_failed), 1);
    assert_eq!(h.provisioner.total_releases(), 2);
}

#[tokio::test]
async fn clean_exit_kills_background_children() {
    let h = Harness::new();
    let pid = h.deploy("sleep 30 >/dev/null 2>&1 &\nexit 0\n").await.unwrap().process.id;

    assert!(h.tick_until(|s| s.registry().is_empty()).await);
    assert!(!group_alive(pid.as_u32()));
    assert_eq!(h.notifier.labels(), vec!["started", "completed"]);
    assert_eq!(h.work_entries(), 0);
}

#[tokio::test]
async fn stop_kills_background_children_ignoring_sigterm() {
    let h = Harness::new();
    let script = "sh -c \"trap '' TERM; sleep 30\" &\nsleep 30\n";
    let pid = h.deploy(script).await.unwrap().process.id;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stopped = tokio::time::timeout(Duration::from_secs(10), h.sup.stop(pid)).await.unwrap();
    assert!(stopped);
    assert!(!group_alive(pid.as_u32()));
    assert!(h.sup.registry().is_empty());
}

#[tokio::test]
async fn restart_kills_previous_background_children() {
    let h = Harness::with(|c| c.max_restarts(1));
    let first = h.deploy("sleep 30 >/dev/null 2>&1 &\nexit 1\n").await.unwrap().process.id;

    assert!(h.tick_until(|_| h.notifier.count(is_restarted) == 1).await);
    assert!(!group_alive(first.as_u32()));

    assert!(h.tick_until(|s| s.registry().is_empty()).await);
    let last = h.notifier.all().pop().unwrap();
    assert!(is_failed(&last.kind), "{:?}", last.kind);
    assert!(!group_alive(last.pid.as_u32()));
}

#[tokio::test]
async fn live_log_is_fetchable_and_downgraded_when_large() {
    let h = Harness::with(|c| c.log_transfer_limit(16));
    let pid = h.deploy("echo hello-from-child\nsleep 30\n").await.unwrap().process.id;

    let mut seen = false;
    for _ in 0..100 {
        let chunk = h.sup.fetch_log(pid, LogMode::Tail { lines: 10 }).unwrap();
        if chunk.content.contains("hello-from-child") {
            seen = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(seen);

    let full = h.sup.fetch_log(pid, LogMode::Full).unwrap();
    assert!(full.truncated);
    assert!(full.total_bytes > 16);
    h.sup.stop(pid).await;
}

#[tokio::test]
async fn zero_retention_deletes_log_at_cleanup() {
    let h = Harness::with(|c| c.log_retention(Duration::ZERO));
    let pid = h.deploy("sleep 30\n").await.unwrap().process.id;
    h.sup.stop(pid).await;

    assert_eq!(h.notifier.all().pop().unwrap().log_retained_secs, Some(0));
    assert!(matches!(h.sup.fetch_log(pid, LogMode::Full), Err(LogError::NotFound(_))));
    assert_eq!(h.log_files(), 0);
}

#[tokio::test]
async fn retained_log_expires_on_tick() {
    let h = Harness::new();
    let pid = h.deploy("sleep 30\n").await.unwrap().process.id;
    h.sup.stop(pid).await;
    assert!(h.sup.fetch_log(pid, LogMode::Full).is_ok());

    h.clock.advance(Duration::from_secs(61));
    h.sup.tick().await;
    assert!(h.sup.fetch_log(pid, LogMode::Full).is_err());
    assert_eq!(h.log_files(), 0);
}

#[tokio::test]
async fn monitor_task_drives_restarts_until_cancelled() {
    let h = Harness::with(|c| c.max_restarts(1));
    h.deploy("exit 2\n").await.unwrap();

    let cancel = tokio_util::sync::CancellationToken::new();
    let monitor = h.sup.spawn_monitor(cancel.clone());
    for _ in 0..200 {
        if h.sup.registry().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    cancel.cancel();
    monitor.await.unwrap();

    assert!(h.sup.registry().is_empty());
    assert_eq!(h.notifier.count(is_restarted), 1);
    assert_eq!(h.notifier.count(is_failed), 1);
}
