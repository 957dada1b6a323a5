// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query handlers for read-only requests.

use dw_core::Clock;
use dw_wire::{ErrorCode, Query, Response};

use super::ListenCtx;
use crate::logs::LogError;
use crate::provision::Provisioner;

pub(super) fn handle_query<P: Provisioner, C: Clock>(ctx: &ListenCtx<P, C>, query: Query) -> Response {
    match query {
        Query::Status => Response::Status { status: ctx.supervisor.status() },

        Query::ListProcesses => Response::Processes { processes: ctx.supervisor.summaries() },

        Query::GetLogs { pid, mode } => match ctx.supervisor.fetch_log(pid, mode) {
            Ok(log) => Response::Logs { log },
            Err(e @ LogError::NotFound(_)) => Response::error(ErrorCode::NotFound, e.to_string()),
            Err(e) => Response::error(ErrorCode::Internal, e.to_string()),
        },
    }
}
