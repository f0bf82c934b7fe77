// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `reef serve` - poll a spool directory for job messages.
//!
//! The spool directory is the boundary to the upstream queue: each
//! `*.json` file is one job message. Accepted files move to `done/`,
//! unparseable ones to `failed/`.

use super::PipelineArgs;
use crate::exit_error::ExitError;
use anyhow::{Context, Result};
use clap::Args;
use reef_core::JobMessage;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Spool directory to poll for job-message JSON files
    #[arg(long)]
    pub spool: PathBuf,

    /// Poll interval in seconds
    #[arg(long, default_value_t = 5)]
    pub poll: u64,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let pipeline = super::build_pipeline(&args.pipeline)?;

    let done_dir = args.spool.join("done");
    let failed_dir = args.spool.join("failed");
    for dir in [&args.spool, &done_dir, &failed_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create spool dir {}", dir.display()))
            .map_err(|e| ExitError::config(format!("{e:#}")))?;
    }

    tracing::info!(spool = %args.spool.display(), poll = args.poll, "serving");
    let mut ticker = tokio::time::interval(Duration::from_secs(args.poll.max(1)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
                break;
            }
            _ = ticker.tick() => {
                for path in spool_files(&args.spool) {
                    dispatch(&pipeline, &path, &done_dir, &failed_dir).await;
                }
            }
        }
    }

    let abandoned = pipeline.shutdown().await;
    if abandoned > 0 {
        return Err(
            ExitError::fatal(format!("cancelled with {abandoned} jobs in flight")).into(),
        );
    }
    Ok(())
}

/// Pending message files, sorted by name so intake order is deterministic.
fn spool_files(spool: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(spool) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json")
        })
        .collect();
    files.sort();
    files
}

async fn dispatch(
    pipeline: &reef_engine::Pipeline,
    path: &Path,
    done_dir: &Path,
    failed_dir: &Path,
) {
    let name = path.file_name().map(PathBuf::from).unwrap_or_default();
    let parsed = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| {
            serde_json::from_slice::<JobMessage>(&bytes).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(msg) => {
            tracing::info!(title = %msg.title, file = %path.display(), "spooled job accepted");
            if pipeline.feed(msg).await {
                move_to(path, &done_dir.join(&name));
            }
        }
        Err(error) => {
            tracing::warn!(file = %path.display(), %error, "unparseable job message");
            move_to(path, &failed_dir.join(&name));
        }
    }
}

fn move_to(from: &Path, to: &Path) {
    if let Err(error) = std::fs::rename(from, to) {
        tracing::warn!(from = %from.display(), to = %to.display(), %error, "spool move failed");
    }
}
