// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use dw_core::ProcessState;

use super::*;

fn record(pid: u32) -> ProcessRecord {
    ProcessRecord::builder().id(ProcessId(pid)).build()
}

#[test]
fn insert_then_get_returns_copy() {
    let registry = Registry::new(4);
    registry.insert(record(10)).unwrap();
    let got = registry.get(ProcessId(10)).unwrap();
    assert_eq!(got.id, ProcessId(10));
    assert_eq!(registry.len(), 1);
}

#[test]
fn duplicate_insert_is_rejected() {
    let registry = Registry::new(4);
    registry.insert(record(10)).unwrap();
    assert_eq!(registry.insert(record(10)), Err(RegistryError::DuplicateId(ProcessId(10))));
}

#[test]
fn capacity_counts_only_live_records() {
    let registry = Registry::new(2);
    registry.insert(record(1)).unwrap();
    registry.insert(ProcessRecord::builder().id(ProcessId(2)).state(ProcessState::Terminated).build()).unwrap();
    assert!(registry.has_capacity());
    registry.insert(record(3)).unwrap();
    assert!(!registry.has_capacity());
    assert_eq!(
        registry.insert(record(4)),
        Err(RegistryError::CapacityExceeded { live: 2, max: 2 })
    );
    assert_eq!(registry.live_count(), 2);
}

#[test]
fn missing_ids_are_not_found() {
    let registry = Registry::new(1);
    let id = ProcessId(99);
    assert_eq!(registry.get(id), Err(RegistryError::NotFound(id)));
    assert_eq!(registry.update(id, |_| ()), Err(RegistryError::NotFound(id)));
    assert_eq!(registry.remove(id), Err(RegistryError::NotFound(id)));
}

#[test]
fn update_returns_mutator_result() {
    let registry = Registry::new(1);
    registry.insert(record(5)).unwrap();
    let claim = registry.update(ProcessId(5), |r| r.claim_stop()).unwrap();
    assert_eq!(claim, dw_core::StopClaim::Claimed);
    assert_eq!(registry.get(ProcessId(5)).unwrap().state, ProcessState::Terminated);
}

#[test]
fn remove_succeeds_once() {
    let registry = Registry::new(1);
    registry.insert(record(5)).unwrap();
    assert!(registry.remove(ProcessId(5)).is_ok());
    assert!(registry.remove(ProcessId(5)).is_err());
    assert!(registry.is_empty());
}

#[test]
fn rekey_moves_accepted_record() {
    let registry = Registry::new(2);
    registry.insert(ProcessRecord::builder().id(ProcessId(1)).state(ProcessState::Restarting).build()).unwrap();
    let moved = registry.rekey(ProcessId(1), ProcessId(2), |r| r.commit_relaunch(ProcessId(2), 7)).unwrap();
    assert!(moved);
    assert!(registry.get(ProcessId(1)).is_err());
    let rec = registry.get(ProcessId(2)).unwrap();
    assert_eq!(rec.state, ProcessState::Running);
    assert_eq!(rec.id, ProcessId(2));
}

#[test]
fn rekey_refusal_leaves_map_untouched() {
    let registry = Registry::new(2);
    let original = ProcessRecord::builder().id(ProcessId(1)).state(ProcessState::Terminated).build();
    registry.insert(original.clone()).unwrap();
    let moved = registry
        .rekey(ProcessId(1), ProcessId(2), |r| {
            r.restart_count = 99;
            false
        })
        .unwrap();
    assert!(!moved);
    assert_eq!(registry.get(ProcessId(1)).unwrap(), original);
    assert!(registry.get(ProcessId(2)).is_err());
}

#[test]
fn rekey_onto_taken_id_is_duplicate() {
    let registry = Registry::new(3);
    registry.insert(record(1)).unwrap();
    registry.insert(record(2)).unwrap();
    assert_eq!(
        registry.rekey(ProcessId(1), ProcessId(2), |_| true),
        Err(RegistryError::DuplicateId(ProcessId(2)))
    );
    assert_eq!(registry.rekey(ProcessId(7), ProcessId(8), |_| true), Err(RegistryError::NotFound(ProcessId(7))));
}

#[test]
fn snapshot_is_detached_copy() {
    let registry = Registry::new(3);
    registry.insert(ProcessRecord::builder().id(ProcessId(2)).started_at_ms(20).build()).unwrap();
    registry.insert(ProcessRecord::builder().id(ProcessId(1)).started_at_ms(10).build()).unwrap();
    let snap = registry.snapshot();
    registry.remove(ProcessId(1)).unwrap();
    assert_eq!(snap.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn concurrent_claims_have_single_winner() {
    let registry = Arc::new(Registry::new(1));
    registry.insert(record(42)).unwrap();
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.update(ProcessId(42), |r| r.claim_stop()).unwrap())
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|c| *c == dw_core::StopClaim::Claimed)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn concurrent_inserts_never_exceed_capacity() {
    let registry = Arc::new(Registry::new(5));
    let handles: Vec<_> = (0..40u32)
        .map(|pid| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.insert(record(pid + 1)).is_ok())
        })
        .collect();
    let accepted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(accepted, 5);
    assert_eq!(registry.live_count(), 5);
}
