// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dw notifications`: drain lifecycle events queued for an owner.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use dw_core::OwnerContext;

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{handle_list, render_notifications, OutputFormat};

#[derive(Args, Debug)]
pub struct NotificationsArgs {
    /// Owner whose inbox to drain (default: $DW_OWNER or $USER)
    #[arg(long)]
    pub owner: Option<String>,

    /// Keep polling until Ctrl-C
    #[arg(long, short)]
    pub follow: bool,

    /// Poll interval in milliseconds with --follow
    #[arg(long, default_value = "2000")]
    pub interval_ms: u64,
}

pub async fn notifications(args: NotificationsArgs, format: OutputFormat) -> Result<()> {
    let owner = args.owner.map(OwnerContext::new).unwrap_or_else(crate::env::owner);
    let client = DaemonClient::connect().map_err(ExitError::from)?;

    let drained = client.notifications(owner.clone()).await.map_err(ExitError::from)?;
    if !args.follow {
        return handle_list(format, &drained, "No notifications", |items, out| {
            render_notifications(items, out)
        });
    }

    if format == OutputFormat::Json {
        eprintln!("warning: --follow prints one JSON array per poll");
    }
    print_batch(&drained, format)?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(args.interval_ms)) => {
                match client.notifications(owner.clone()).await {
                    Ok(batch) => print_batch(&batch, format)?,
                    Err(e) if e.is_not_running() => return Err(ExitError::from(e).into()),
                    // Transient failure; retry on the next poll
                    Err(_) => {}
                }
            }
            _ = &mut ctrl_c => break,
        }
    }
    Ok(())
}

fn print_batch(batch: &[dw_core::Notification], format: OutputFormat) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(batch)?),
        OutputFormat::Text => render_notifications(batch, &mut std::io::stdout()),
    }
    Ok(())
}
