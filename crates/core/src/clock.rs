// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so runtime and retention checks can be tested

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;

    /// Whole milliseconds elapsed since `since_ms`, saturating at zero.
    fn elapsed_ms(&self, since_ms: u64) -> u64 {
        self.epoch_ms().saturating_sub(since_ms)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// Manually driven clock; clones share the same time.
#[derive(Clone, Debug)]
pub struct FakeClock {
    inner: Arc<Mutex<(Instant, u64)>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new((Instant::now(), 1_000_000))) }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.lock();
        guard.0 += by;
        guard.1 += by.as_millis() as u64;
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        self.inner.lock().1 = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().0
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().1
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
