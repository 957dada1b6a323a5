// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dw-core: Core types for the Deploy Warden process supervisor

pub mod macros;

pub mod clock;
pub mod environment;
pub mod id;
pub mod notification;
pub mod owner;
pub mod process;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use environment::EnvironmentHandle;
pub use id::{short, DeploymentId};
pub use notification::{Notification, NotificationKind};
pub use owner::OwnerContext;
#[cfg(any(test, feature = "test-support"))]
pub use process::ProcessRecordBuilder;
pub use process::{
    ChildExit, ExitDecision, ProcessId, ProcessRecord, ProcessState, ProcessSummary, StopClaim,
};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
