// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle notification delivery.
//!
//! The supervisor hands every [`Notification`] to a [`Notifier`]. The daemon
//! uses a [`NotificationHub`], which keeps a bounded inbox per owner for the
//! gateway to drain and can mirror each message to the desktop. Delivery is
//! best effort: a failure is logged by the caller and never undoes the
//! transition that produced it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use dw_core::{Notification, OwnerContext};
use parking_lot::Mutex;
use thiserror::Error;

/// Undrained notifications kept per owner; the oldest are dropped first.
pub const INBOX_CAPACITY: usize = 256;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Sink for lifecycle notifications
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Per-owner inboxes, optionally mirrored to desktop notifications.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inboxes: Arc<Mutex<HashMap<OwnerContext, VecDeque<Notification>>>>,
    desktop: Option<DesktopNotifier>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_desktop(mut self, desktop: DesktopNotifier) -> Self {
        self.desktop = Some(desktop);
        self
    }

    /// Take everything queued for `owner`, oldest first.
    pub fn drain(&self, owner: &OwnerContext) -> Vec<Notification> {
        self.inboxes.lock().remove(owner).map(Vec::from).unwrap_or_default()
    }

    pub fn pending(&self, owner: &OwnerContext) -> usize {
        self.inboxes.lock().get(owner).map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl Notifier for NotificationHub {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        {
            let mut inboxes = self.inboxes.lock();
            let inbox = inboxes.entry(notification.owner.clone()).or_default();
            if inbox.len() >= INBOX_CAPACITY {
                inbox.pop_front();
            }
            inbox.push_back(notification.clone());
        }
        if let Some(desktop) = &self.desktop {
            desktop.notify(notification).await?;
        }
        Ok(())
    }
}

/// Desktop notifications through notify-rust.
///
/// On macOS the first notification would look up a bundle identifier via
/// AppleScript, which blocks forever in a daemon without Automation
/// permissions. The identifier is set up front to skip that lookup.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let title = format!("dw: {} {}", notification.script_name, notification.kind.label());
        let message = notification.message();
        // show() is synchronous on some platforms; keep it off the runtime
        tokio::task::spawn_blocking(move || {
            match notify_rust::Notification::new().summary(&title).body(&message).show() {
                Ok(_) => tracing::debug!(%title, "desktop notification sent"),
                Err(e) => tracing::warn!(%title, error = %e, "desktop notification failed"),
            }
        });
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Notifier, NotifyError};
    use async_trait::async_trait;
    use dw_core::{Notification, NotificationKind, ProcessId};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake notifier recording everything it is handed
    #[derive(Clone, Default)]
    pub struct FakeNotifier {
        inner: Arc<Mutex<Vec<Notification>>>,
    }

    impl FakeNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn all(&self) -> Vec<Notification> {
            self.inner.lock().clone()
        }

        /// Labels of every notification in delivery order.
        pub fn labels(&self) -> Vec<&'static str> {
            self.inner.lock().iter().map(|n| n.kind.label()).collect()
        }

        pub fn count(&self, matches: impl Fn(&NotificationKind) -> bool) -> usize {
            self.inner.lock().iter().filter(|n| matches(&n.kind)).count()
        }

        pub fn for_pid(&self, pid: ProcessId) -> Vec<Notification> {
            self.inner.lock().iter().filter(|n| n.pid == pid).cloned().collect()
        }
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.inner.lock().push(notification.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifier;

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
