// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stage framework: uniform worker loops linked by bounded channels.

use crate::error::{PipelineError, StageError};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default bound for the channels linking stages. Bounded channels make
/// a slow downstream stage exert backpressure instead of dropping work.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// One pipeline stage.
///
/// A stage is driven by [`spawn_stage`]: it receives items in arrival
/// order, does its work in `process`, and either forwards the output or
/// surfaces a recoverable [`StageError`].
#[async_trait]
pub trait Stage: Send + 'static {
    type In: Send + 'static;
    type Out: Send + 'static;

    fn name(&self) -> &'static str;

    async fn process(&mut self, item: Self::In) -> Result<Self::Out, StageError>;
}

/// Non-blocking publisher for the shared error channel.
///
/// `report` never blocks a stage: if the channel is full or nobody is
/// listening the error is logged and dropped.
#[derive(Clone, Debug)]
pub struct ErrorSink {
    tx: mpsc::Sender<PipelineError>,
}

impl ErrorSink {
    pub fn new(tx: mpsc::Sender<PipelineError>) -> Self {
        Self { tx }
    }

    pub fn report(&self, stage: &'static str, error: StageError) {
        let error = PipelineError { stage, error };
        tracing::warn!(%error, "stage error");
        let _ = self.tx.try_send(error);
    }
}

/// Run one stage worker until its input closes or the token fires.
///
/// Items are forwarded in arrival order. A failed item is published on
/// the error sink and dropped; surviving items are never reordered.
/// Cancellation returns cleanly with no further sends.
pub fn spawn_stage<S: Stage>(
    mut stage: S,
    mut rx: mpsc::Receiver<S::In>,
    tx: mpsc::Sender<S::Out>,
    errors: ErrorSink,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return,
                item = rx.recv() => match item {
                    Some(item) => item,
                    None => return,
                },
            };

            match stage.process(item).await {
                Ok(out) => {
                    if tx.send(out).await.is_err() {
                        return;
                    }
                }
                Err(error) => errors.report(stage.name(), error),
            }
        }
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
