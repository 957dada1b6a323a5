// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process registry: the single source of truth for what is running.
//!
//! Every operation takes the lock once, so mutations are linearizable. The
//! lock is a `parking_lot::Mutex` and is never held across an `.await`.

use std::collections::HashMap;

use dw_core::{ProcessId, ProcessRecord};
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no process with id {0}")]
    NotFound(ProcessId),

    #[error("process id {0} is already registered")]
    DuplicateId(ProcessId),

    #[error("capacity exceeded: {live} of {max} processes running")]
    CapacityExceeded { live: usize, max: usize },
}

/// Concurrency-safe `ProcessId -> ProcessRecord` map with a live-record cap.
pub struct Registry {
    records: Mutex<HashMap<ProcessId, ProcessRecord>>,
    capacity: usize,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self { records: Mutex::new(HashMap::new()), capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a record. Rejects an id that is present, and a live record that
    /// would push the live count past capacity.
    pub fn insert(&self, record: ProcessRecord) -> Result<(), RegistryError> {
        let mut records = self.records.lock();
        if records.contains_key(&record.id) {
            return Err(RegistryError::DuplicateId(record.id));
        }
        if record.state.is_live() {
            let live = count_live(&records);
            if live >= self.capacity {
                return Err(RegistryError::CapacityExceeded { live, max: self.capacity });
            }
        }
        records.insert(record.id, record);
        Ok(())
    }

    pub fn get(&self, id: ProcessId) -> Result<ProcessRecord, RegistryError> {
        self.records.lock().get(&id).cloned().ok_or(RegistryError::NotFound(id))
    }

    /// Apply `mutator` to the record under the lock and return its result.
    pub fn update<T>(
        &self,
        id: ProcessId,
        mutator: impl FnOnce(&mut ProcessRecord) -> T,
    ) -> Result<T, RegistryError> {
        let mut records = self.records.lock();
        let record = records.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        Ok(mutator(record))
    }

    /// Move a record from `old` to `new` if `mutator` accepts it.
    ///
    /// The mutator runs on a copy; when it returns `false` the map is left
    /// exactly as it was. The mutator is expected to set `record.id = new`.
    pub fn rekey(
        &self,
        old: ProcessId,
        new: ProcessId,
        mutator: impl FnOnce(&mut ProcessRecord) -> bool,
    ) -> Result<bool, RegistryError> {
        let mut records = self.records.lock();
        let current = records.get(&old).ok_or(RegistryError::NotFound(old))?;
        if old != new && records.contains_key(&new) {
            return Err(RegistryError::DuplicateId(new));
        }
        let mut candidate = current.clone();
        if !mutator(&mut candidate) {
            return Ok(false);
        }
        candidate.id = new;
        records.remove(&old);
        records.insert(new, candidate);
        Ok(true)
    }

    pub fn remove(&self, id: ProcessId) -> Result<ProcessRecord, RegistryError> {
        self.records.lock().remove(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Point-in-time copy, ordered by start time then id.
    pub fn snapshot(&self) -> Vec<ProcessRecord> {
        let mut records: Vec<ProcessRecord> = self.records.lock().values().cloned().collect();
        records.sort_by_key(|r| (r.started_at_ms, r.id));
        records
    }

    pub fn live_count(&self) -> usize {
        count_live(&self.records.lock())
    }

    pub fn has_capacity(&self) -> bool {
        self.live_count() < self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

fn count_live(records: &HashMap<ProcessId, ProcessRecord>) -> usize {
    records.values().filter(|r| r.state.is_live()).count()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
