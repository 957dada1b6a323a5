// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque owner context used to route notifications.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Identifies who asked for a deployment.
///
/// The supervisor never interprets it; notifications are addressed to it and
/// the gateway drains them per owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerContext(SmolStr);

impl OwnerContext {
    pub fn new(value: impl Into<SmolStr>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerContext {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OwnerContext {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
#[path = "owner_tests.rs"]
mod tests;
