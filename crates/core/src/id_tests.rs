// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn deployment_id_has_prefix_and_fixed_length() {
    let id = DeploymentId::new();
    assert!(id.as_str().starts_with("dep-"));
    assert_eq!(id.as_str().len(), 23);
    assert_eq!(id.suffix().len(), 19);
}

#[test]
fn deployment_ids_are_unique() {
    let a = DeploymentId::new();
    let b = DeploymentId::new();
    assert_ne!(a, b);
}

#[test]
fn deployment_id_map_lookup_by_str() {
    let id = DeploymentId::from_string("dep-abc");
    let mut map = HashMap::new();
    map.insert(id, 7);
    assert_eq!(map.get("dep-abc"), Some(&7));
}

#[test]
fn deployment_id_short_uses_suffix() {
    let id = DeploymentId::from_string("dep-abcdefghij");
    assert_eq!(id.short(4), "abcd");
    assert_eq!(id.short(100), "abcdefghij");
}

#[test]
fn deployment_id_serializes_transparently() {
    let id = DeploymentId::from_string("dep-xyz");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"dep-xyz\"");
    let back: DeploymentId = serde_json::from_str("\"dep-xyz\"").unwrap();
    assert_eq!(back, id);
}

#[yare::parameterized(
    longer = { "abcdefghijklmnop", 8, "abcdefgh" },
    shorter = { "abc", 8, "abc" },
    exact = { "abcdefgh", 8, "abcdefgh" },
    empty = { "", 3, "" },
)]
fn short_truncates(input: &str, n: usize, expected: &str) {
    assert_eq!(short(input, n), expected);
}
