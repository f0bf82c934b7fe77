// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `reef run` - process job-message files through one pipeline run.

use super::PipelineArgs;
use crate::exit_error::ExitError;
use anyhow::{Context, Result};
use clap::Args;
use reef_core::JobMessage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job message files (JSON)
    #[arg(required = true)]
    pub messages: Vec<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let pipeline = super::build_pipeline(&args.pipeline)?;

    // Ctrl-C cancels the pipeline token; record how much work was
    // abandoned so the exit code can reflect it.
    let cancel = pipeline.cancel_token();
    let tracker = pipeline.in_flight_tracker();
    let abandoned = Arc::new(AtomicUsize::new(0));
    let abandoned_at_cancel = Arc::clone(&abandoned);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling in-flight jobs");
            abandoned_at_cancel.store(tracker.count(), Ordering::SeqCst);
            cancel.cancel();
        }
    });

    let mut fed = 0usize;
    for path in &args.messages {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read message file {}", path.display()))?;
        let msg: JobMessage = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse message file {}", path.display()))?;
        tracing::info!(title = %msg.title, file = %path.display(), "feeding job");
        if !pipeline.feed(msg).await {
            break;
        }
        fed += 1;
    }

    pipeline.drain().await;

    let abandoned = abandoned.load(Ordering::SeqCst);
    if abandoned > 0 {
        return Err(
            ExitError::fatal(format!("cancelled with {abandoned} jobs in flight")).into(),
        );
    }
    tracing::info!(jobs = fed, "pipeline drained");
    Ok(())
}
