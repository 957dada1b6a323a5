// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serializes_as_bare_string() {
    let owner = OwnerContext::new("alice");
    assert_eq!(serde_json::to_string(&owner).unwrap(), r#""alice""#);

    let decoded: OwnerContext = serde_json::from_str(r#""chat:42""#).unwrap();
    assert_eq!(decoded.as_str(), "chat:42");
}

#[test]
fn conversions_agree() {
    assert_eq!(OwnerContext::from("bob"), OwnerContext::from("bob".to_string()));
    assert_eq!(OwnerContext::new("bob").to_string(), "bob");
}
