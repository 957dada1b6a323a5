// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod daemon;
pub mod deploy;
pub mod notifications;
pub mod process;
