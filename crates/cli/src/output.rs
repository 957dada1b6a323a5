// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use dw_core::{Notification, ProcessSummary};
use serde::Serialize;

use crate::table::{Column, Table};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a timestamp as relative time (e.g., "5s", "2m 3s", "1h 4m")
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    dw_core::format_elapsed(now_ms.saturating_sub(epoch_ms) / 1000)
}

/// Render a list as text table or JSON. Handles empty check + format branch.
pub fn handle_list<T: Serialize>(
    format: OutputFormat,
    items: &[T],
    empty_msg: &str,
    render_text: impl FnOnce(&[T], &mut dyn Write),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty_msg);
            } else {
                render_text(items, &mut std::io::stdout());
            }
        }
    }
    Ok(())
}

/// Format-branch helper for non-list commands.
///
/// Renders as JSON when `format` is `Json`, otherwise calls `text_fn`.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Process table shared by `dw ps` and `dw status`.
pub fn render_processes(processes: &[ProcessSummary], out: &mut dyn Write) {
    let mut table = Table::new(vec![
        Column::right("PID"),
        Column::left("SCRIPT").with_max(24),
        Column::status("STATE"),
        Column::right("RESTARTS"),
        Column::right("UPTIME"),
        Column::muted("OWNER").with_max(16),
        Column::muted("DEPLOYMENT"),
    ]);
    for p in processes {
        let mut script = p.script_name.clone();
        if !p.isolated {
            script.push('*');
        }
        table.row(vec![
            p.id.to_string(),
            script,
            p.state.to_string(),
            format!("{}/{}", p.restart_count, p.max_restarts),
            dw_core::format_elapsed(p.runtime_secs),
            p.owner.to_string(),
            p.deployment.to_string(),
        ]);
    }
    table.render(out);
    if processes.iter().any(|p| !p.isolated) {
        let _ = writeln!(out, "\n{}", crate::color::muted("* shared interpreter, not isolated"));
    }
}

/// One line per notification, oldest first.
pub fn render_notifications(notifications: &[Notification], out: &mut dyn Write) {
    for n in notifications {
        let label = n.kind.label();
        let padding = " ".repeat(10usize.saturating_sub(label.len()));
        let _ = writeln!(
            out,
            "{}  {}{}  {}",
            crate::color::muted(&format!("{:>8}", format_time_ago(n.at_ms))),
            crate::color::status(label),
            padding,
            n.message()
        );
    }
}
