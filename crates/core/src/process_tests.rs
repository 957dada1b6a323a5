// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn running(restart_count: u32, max_restarts: u32) -> ProcessRecord {
    ProcessRecord::builder().restart_count(restart_count).max_restarts(max_restarts).build()
}

#[test]
fn clean_exit_completes() {
    let mut record = running(0, 3);
    assert_eq!(record.on_exit(ChildExit::Code(0)), ExitDecision::Completed);
    assert_eq!(record.state, ProcessState::Exited(0));
}

#[yare::parameterized(
    nonzero_code = { ChildExit::Code(1) },
    signal = { ChildExit::Signal(9) },
    unknown = { ChildExit::Unknown },
)]
fn failure_with_budget_restarts(exit: ChildExit) {
    let mut record = running(1, 3);
    assert_eq!(record.on_exit(exit), ExitDecision::Restart { attempt: 2 });
    assert_eq!(record.state, ProcessState::Restarting);
    assert_eq!(record.restart_count, 2);
}

#[test]
fn failure_with_exhausted_budget_gives_up() {
    let mut record = running(3, 3);
    let decision = record.on_exit(ChildExit::Code(2));
    assert_eq!(decision, ExitDecision::GiveUp { reason: "exited with code 2".to_string() });
    assert_eq!(record.state, ProcessState::Terminated);
    assert_eq!(record.restart_count, 3);
}

#[test]
fn zero_max_restarts_never_restarts() {
    let mut record = running(0, 0);
    assert!(matches!(record.on_exit(ChildExit::Signal(15)), ExitDecision::GiveUp { .. }));
}

#[test]
fn repeated_failures_restart_exactly_max_times() {
    let mut record = running(0, 3);
    let mut restarts = 0;
    loop {
        match record.on_exit(ChildExit::Code(1)) {
            ExitDecision::Restart { .. } => {
                restarts += 1;
                assert!(record.commit_relaunch(ProcessId(5000 + restarts), 0));
            }
            ExitDecision::GiveUp { .. } => break,
            other => panic!("unexpected decision {:?}", other),
        }
    }
    assert_eq!(restarts, 3);
    assert!(record.restart_count <= record.max_restarts);
}

#[yare::parameterized(
    restarting = { ProcessState::Restarting },
    terminated = { ProcessState::Terminated },
    exited = { ProcessState::Exited(0) },
    cleaned_up = { ProcessState::CleanedUp },
)]
fn exit_on_non_running_record_is_already_claimed(state: ProcessState) {
    let mut record = ProcessRecord::builder().state(state.clone()).build();
    assert_eq!(record.on_exit(ChildExit::Code(1)), ExitDecision::AlreadyClaimed);
    assert_eq!(record.state, state);
}

#[yare::parameterized(
    starting = { ProcessState::Starting, StopClaim::Claimed },
    running = { ProcessState::Running, StopClaim::Claimed },
    restarting = { ProcessState::Restarting, StopClaim::ClaimedDuringRestart },
    terminated = { ProcessState::Terminated, StopClaim::NotLive },
    exited = { ProcessState::Exited(0), StopClaim::NotLive },
)]
fn claim_stop(state: ProcessState, expected: StopClaim) {
    let mut record = ProcessRecord::builder().state(state).build();
    assert_eq!(record.claim_stop(), expected);
    if expected != StopClaim::NotLive {
        assert_eq!(record.state, ProcessState::Terminated);
    }
}

#[test]
fn second_stop_claim_is_not_live() {
    let mut record = running(0, 3);
    assert_eq!(record.claim_stop(), StopClaim::Claimed);
    assert_eq!(record.claim_stop(), StopClaim::NotLive);
}

#[test]
fn commit_relaunch_requires_restarting() {
    let mut record = ProcessRecord::builder().state(ProcessState::Restarting).build();
    assert!(record.commit_relaunch(ProcessId(77), 2_000_000));
    assert_eq!(record.id, ProcessId(77));
    assert_eq!(record.state, ProcessState::Running);
    assert_eq!(record.started_at_ms, 2_000_000);

    let mut stopped = ProcessRecord::builder().state(ProcessState::Terminated).build();
    assert!(!stopped.commit_relaunch(ProcessId(78), 0));
    assert_eq!(stopped.id, ProcessId(4242));
}

#[test]
fn promote_only_from_starting() {
    let mut record = ProcessRecord::builder().state(ProcessState::Starting).build();
    assert!(record.promote());
    assert_eq!(record.state, ProcessState::Running);
    assert!(!record.promote());
}

#[test]
fn summary_reports_runtime() {
    let record = ProcessRecord::builder().started_at_ms(10_000).restart_count(1).build();
    let summary = record.summary(75_500);
    assert_eq!(summary.runtime_secs, 65);
    assert_eq!(summary.restart_count, 1);
    assert_eq!(summary.max_restarts, 3);
    assert!(!summary.isolated);
}

#[test]
fn state_serializes_with_detail() {
    let json = serde_json::to_value(ProcessState::Exited(3)).unwrap();
    assert_eq!(json, serde_json::json!({"state": "exited", "detail": 3}));
    let json = serde_json::to_value(ProcessState::Running).unwrap();
    assert_eq!(json, serde_json::json!({"state": "running"}));
}

#[test]
fn live_and_terminal_are_disjoint() {
    for state in [
        ProcessState::Starting,
        ProcessState::Running,
        ProcessState::Exited(1),
        ProcessState::Failed("x".into()),
        ProcessState::Restarting,
        ProcessState::Terminated,
        ProcessState::CleanedUp,
    ] {
        assert!(!(state.is_live() && state.is_terminal()), "{}", state);
    }
}

#[test]
fn process_id_parses_with_whitespace() {
    assert_eq!(" 123 ".parse::<ProcessId>().unwrap(), ProcessId(123));
    assert!("abc".parse::<ProcessId>().is_err());
}
