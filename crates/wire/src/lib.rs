// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between the `dw` CLI and the `dwd` daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod query;
mod request;
mod response;
mod status;
mod wire;

pub use query::Query;
pub use request::Request;
pub use response::{ErrorCode, Response};
pub use status::{LogChunk, LogMode, StatusReport};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_BYTES};
pub use wire::{read_request, read_response, write_request, write_response};

/// Protocol version exchanged in `Hello`.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");
