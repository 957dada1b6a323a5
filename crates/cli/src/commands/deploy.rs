// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dw deploy` and `dw manifest`

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use dw_core::OwnerContext;

use crate::client_lifecycle::connect_or_start;
use crate::client_queries::DeploySubmission;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Script to run under supervision
    pub script: PathBuf,

    /// Requirements file listing packages to install (skips discovery)
    #[arg(long, short = 'r')]
    pub manifest: Option<PathBuf>,

    /// Wait for a manifest staged with `dw manifest`
    #[arg(long, conflicts_with = "manifest")]
    pub wait_manifest: bool,

    /// Name reported in status and notifications (default: file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Owner that receives notifications (default: $DW_OWNER or $USER)
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Requirements file for the owner's next deploy
    pub file: PathBuf,

    #[arg(long)]
    pub owner: Option<String>,
}

pub async fn deploy(args: DeployArgs, format: OutputFormat) -> Result<()> {
    let submission = build_submission(&args)?;
    let client = connect_or_start().await.map_err(ExitError::from)?;
    let (process, warnings) = client.deploy(submission).await.map_err(ExitError::from)?;

    let obj = serde_json::json!({ "process": process, "warnings": warnings });
    format_or_json(format, &obj, || {
        println!(
            "Deployed {} (pid {}, {})",
            crate::color::header(&process.script_name),
            process.id,
            crate::color::muted(process.deployment.as_str())
        );
        for warning in &warnings {
            eprintln!("warning: {warning}");
        }
        println!("  dw logs {}    # view output", process.id);
        println!("  dw stop {}    # stop it", process.id);
    })
}

pub async fn manifest(args: ManifestArgs, format: OutputFormat) -> Result<()> {
    let content = read_text(&args.file)?;
    let owner = resolve_owner(args.owner);
    let client = connect_or_start().await.map_err(ExitError::from)?;
    let packages =
        client.stage_manifest(owner.clone(), content).await.map_err(ExitError::from)?;

    let obj = serde_json::json!({ "owner": owner, "packages": packages });
    format_or_json(format, &obj, || {
        println!("Staged {} package(s) for {}'s next deploy", packages, owner);
    })
}

/// Read the script (and manifest) from disk into a deploy request.
pub fn build_submission(args: &DeployArgs) -> Result<DeploySubmission> {
    let script = std::fs::read(&args.script)
        .with_context(|| format!("cannot read {}", args.script.display()))?;
    let script_name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .script
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{} has no usable file name", args.script.display()))?,
    };
    let manifest = args.manifest.as_deref().map(read_text).transpose()?;

    Ok(DeploySubmission {
        script_name,
        script,
        manifest,
        owner: resolve_owner(args.owner.clone()),
        wait_for_manifest: args.wait_manifest,
    })
}

fn resolve_owner(explicit: Option<String>) -> OwnerContext {
    explicit.map(OwnerContext::new).unwrap_or_else(crate::env::owner)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
