// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy Warden daemon library
//!
//! Supervises deployed scripts as child processes. The `dwd` binary wires
//! these modules together; the CLI links against the library for the shared
//! environment helpers and state-directory layout.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod logs;
pub mod notify;
pub mod provision;
pub mod registry;
pub mod supervisor;

pub use lifecycle::{Config, ConfigError, LifecycleError};
pub use listener::{ListenCtx, Listener};
pub use logs::{LogError, LogLimits, LogManager};
pub use notify::{DesktopNotifier, NotificationHub, Notifier, NotifyError};
pub use provision::{ManifestInbox, ProvisionConfig, ProvisionError, Provisioner, VenvProvisioner};
pub use registry::{Registry, RegistryError};
pub use supervisor::{DeployError, DeployOutcome, DeployRequest, Supervisor, SupervisorConfig};

#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifier;
#[cfg(any(test, feature = "test-support"))]
pub use provision::FakeProvisioner;
