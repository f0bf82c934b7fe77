// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job record: one message's traversal of the pipeline.

use reef_core::{AuditSummary, JobMessage, Report, ResultMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counts records currently alive anywhere in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn guard(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.0))
    }
}

#[derive(Debug)]
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Purges the extraction directory when the record is released,
/// whether the job completed, failed, or was cancelled.
#[derive(Debug, Default)]
struct CleanupGuard {
    path: Option<PathBuf>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        if let Err(error) = std::fs::remove_dir_all(&path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %error, "failed to purge extraction dir");
            }
        }
    }
}

/// Parsed compatibility report handed from the analyse stage to the
/// mapper. Scratch state on the record, not part of the result map.
#[derive(Debug)]
pub struct PendingCompat {
    pub standard: String,
    pub raw_storage_key: String,
    pub parsed_storage_key: String,
    pub summary: AuditSummary,
    pub report: Report,
}

/// A job record flows through every stage exactly once. It owns the
/// original message, the append-only result map, and the cancellation
/// token covering all of the job's I/O.
#[derive(Debug)]
pub struct JobRecord {
    pub message: JobMessage,
    pub results: ResultMap,
    /// Extraction root, set by ingest and valid for the rest of the job.
    pub files_path: Option<PathBuf>,
    pub cancel: CancellationToken,
    pub pending_compat: Vec<PendingCompat>,
    cleanup: CleanupGuard,
    _in_flight: InFlightGuard,
}

impl JobRecord {
    pub fn new(message: JobMessage, cancel: CancellationToken, in_flight: &InFlight) -> Self {
        Self {
            message,
            results: ResultMap::new(),
            files_path: None,
            cancel,
            pending_compat: Vec::new(),
            cleanup: CleanupGuard::default(),
            _in_flight: in_flight.guard(),
        }
    }

    /// Register the extraction directory for purge on release.
    pub fn arm_cleanup(&mut self, path: PathBuf) {
        self.cleanup.path = Some(path);
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
