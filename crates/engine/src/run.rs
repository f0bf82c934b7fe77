// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline assembly and lifecycle.
//!
//! Wires the five stages with bounded channels, one worker task each,
//! plus a drain for completed records and one for the shared error
//! channel. Per-job cancellation tokens are children of the pipeline
//! token, so shutting the pipeline down aborts every in-flight job.

use crate::compat_map::CompatMap;
use crate::error::ConfigError;
use crate::info::Info;
use crate::ingest::Ingest;
use crate::phpcs::{Analyse, StandardVersions};
use crate::pipeline::{spawn_stage, ErrorSink};
use crate::record::InFlight;
use crate::respond::Respond;
use reef_adapters::{ResponseClient, Runner, SourceFactory, StorageProvider};
use reef_core::JobMessage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct PipelineConfig {
    pub temp_root: PathBuf,
    pub versions: StandardVersions,
    pub channel_capacity: usize,
}

pub struct PipelineDeps {
    pub sources: Arc<dyn SourceFactory>,
    pub storage: Arc<dyn StorageProvider>,
    pub runner: Arc<dyn Runner>,
    pub response: Arc<dyn ResponseClient>,
}

/// A running pipeline: an intake channel plus its worker tasks.
pub struct Pipeline {
    input: mpsc::Sender<JobMessage>,
    cancel: CancellationToken,
    in_flight: InFlight,
    workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Validate stage dependencies and start the workers.
    pub fn configure(config: PipelineConfig, deps: PipelineDeps) -> Result<Self, ConfigError> {
        if config.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let capacity = config.channel_capacity;
        let cancel = CancellationToken::new();
        let in_flight = InFlight::new();

        let (error_tx, mut error_rx) = mpsc::channel(capacity.max(16));
        let errors = ErrorSink::new(error_tx);

        let ingest = Ingest::configure(
            config.temp_root.clone(),
            deps.sources,
            cancel.clone(),
            in_flight.clone(),
        )?;
        let info = Info::new();
        let analyse = Analyse::configure(
            config.temp_root,
            deps.storage,
            deps.runner,
            config.versions,
            errors.clone(),
        )?;
        let compat = CompatMap::new(errors.clone());
        let respond = Respond::new(deps.response);

        let (input_tx, input_rx) = mpsc::channel(capacity);
        let (info_tx, info_rx) = mpsc::channel(capacity);
        let (analyse_tx, analyse_rx) = mpsc::channel(capacity);
        let (compat_tx, compat_rx) = mpsc::channel(capacity);
        let (respond_tx, respond_rx) = mpsc::channel(capacity);
        let (done_tx, mut done_rx) = mpsc::channel(capacity);

        let workers = vec![
            spawn_stage(ingest, input_rx, info_tx, errors.clone(), cancel.clone()),
            spawn_stage(info, info_rx, analyse_tx, errors.clone(), cancel.clone()),
            spawn_stage(analyse, analyse_rx, compat_tx, errors.clone(), cancel.clone()),
            spawn_stage(compat, compat_rx, respond_tx, errors.clone(), cancel.clone()),
            spawn_stage(respond, respond_rx, done_tx, errors.clone(), cancel.clone()),
            // Completed records are released here; their cleanup guards
            // purge the extraction directories.
            tokio::spawn(async move {
                while let Some(record) = done_rx.recv().await {
                    tracing::debug!(title = %record.message.title, "job complete");
                }
            }),
            // Keep a listener on the error channel so stage reports are
            // delivered rather than dropped.
            tokio::spawn(async move {
                while error_rx.recv().await.is_some() {}
            }),
        ];

        Ok(Self {
            input: input_tx,
            cancel,
            in_flight,
            workers,
        })
    }

    /// Enqueue one job message. Returns false once the pipeline is shut
    /// down.
    pub async fn feed(&self, msg: JobMessage) -> bool {
        self.input.send(msg).await.is_ok()
    }

    /// Records currently alive in the pipeline.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Handle to the in-flight counter.
    pub fn in_flight_tracker(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Clone of the pipeline-wide cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Close the intake and wait for every worker to finish. Jobs
    /// already accepted drain to completion unless the token fires.
    pub async fn drain(self) {
        let Pipeline { input, workers, .. } = self;
        drop(input);
        for worker in workers {
            let _ = worker.await;
        }
    }

    /// Cancel all in-flight work and wait for the workers. Returns the
    /// number of records that were alive when the token fired.
    pub async fn shutdown(self) -> usize {
        let abandoned = self.in_flight.count();
        self.cancel.cancel();
        let Pipeline { input, workers, .. } = self;
        drop(input);
        for worker in workers {
            let _ = worker.await;
        }
        abandoned
    }
}
