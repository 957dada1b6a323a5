// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requirements-style manifests and the per-owner staging inbox.

use std::collections::HashMap;
use std::time::Duration;

use dw_core::OwnerContext;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Package requirements from a requirements-style manifest.
///
/// One requirement per line; `#` starts a comment; blank lines and pip option lines
/// (`-r`, `--index-url`, ...) are skipped.
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .map(str::to_string)
        .collect()
}

struct Staged {
    content: String,
    at: Instant,
}

/// Manifests staged by owners ahead of (or just after) a deploy.
///
/// A staged manifest is only handed out within `window` of being staged;
/// older ones are discarded on access.
pub struct ManifestInbox {
    staged: Mutex<HashMap<OwnerContext, Staged>>,
    arrived: Notify,
    window: Duration,
}

impl ManifestInbox {
    pub fn new(window: Duration) -> Self {
        Self { staged: Mutex::new(HashMap::new()), arrived: Notify::new(), window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Stage `content` for the owner's next deploy, replacing any earlier
    /// one. Returns the number of package requirements it contains.
    pub fn stage(&self, owner: OwnerContext, content: String) -> usize {
        let packages = parse_manifest(&content).len();
        self.staged.lock().insert(owner, Staged { content, at: Instant::now() });
        self.arrived.notify_waiters();
        packages
    }

    /// Take a fresh manifest for `owner`, if any.
    pub fn take(&self, owner: &OwnerContext) -> Option<String> {
        let staged = self.staged.lock().remove(owner)?;
        (staged.at.elapsed() <= self.window).then_some(staged.content)
    }

    /// Take a manifest for `owner`, waiting up to the window for one to be
    /// staged.
    pub async fn wait_for(&self, owner: &OwnerContext) -> Option<String> {
        let deadline = Instant::now() + self.window;
        loop {
            let notified = self.arrived.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(content) = self.take(owner) {
                return Some(content);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.take(owner);
            }
        }
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
