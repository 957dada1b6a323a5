// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core types.
pub mod strategies {
    use crate::process::{ProcessId, ProcessState};
    use proptest::prelude::*;

    pub fn arb_process_id() -> impl Strategy<Value = ProcessId> {
        (1u32..4_000_000).prop_map(ProcessId)
    }

    pub fn arb_process_state() -> impl Strategy<Value = ProcessState> {
        prop_oneof![
            Just(ProcessState::Starting),
            Just(ProcessState::Running),
            any::<i32>().prop_map(ProcessState::Exited),
            "[a-z ]{0,20}".prop_map(ProcessState::Failed),
            Just(ProcessState::Restarting),
            Just(ProcessState::Terminated),
            Just(ProcessState::CleanedUp),
        ]
    }
}
