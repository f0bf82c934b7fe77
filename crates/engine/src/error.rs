// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the pipeline.
//!
//! Configuration errors are fatal and halt startup. Stage errors are
//! recoverable: each one skips a single job or a single audit, and the
//! stage worker keeps processing.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures raised while wiring stages, before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no temp folder provided for processes")]
    NoTempFolder,
    #[error("temp folder {path} is unusable: {reason}")]
    BadTempFolder { path: PathBuf, reason: String },
    #[error("no sniffer versions table provided")]
    NoVersions,
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,
}

/// Recoverable stage failures.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] reef_core::MessageError),
    #[error("could not get appropriate source manager to handle ingest: {0}")]
    NoSourceManager(String),
    #[error("source acquisition failed: {0}")]
    SourceAcquisition(String),
    #[error("could not calculate project checksum")]
    EmptyChecksum,
    #[error("missing prerequisite result: {0}")]
    MissingPrerequisite(&'static str),
    #[error("audit {standard}: no sniffer versions configured")]
    MissingVersions { standard: String },
    #[error("audit {standard}: sniffer exited with code {exit_code}: {stderr}")]
    AuditInternal {
        standard: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("audit {standard}: report unreadable: {reason}")]
    ReportUnreadable { standard: String, reason: String },
    #[error("audit {standard}: artifact upload failed: {reason}")]
    Upload { standard: String, reason: String },
    #[error("compatibility mapping failed: {0}")]
    Compat(#[from] reef_core::CompatError),
    #[error("result map conflict: {0}")]
    ResultConflict(#[from] reef_core::ResultMapError),
    #[error("response post failed: {0}")]
    ResponsePost(String),
    #[error("cancelled")]
    Cancelled,
}

/// A stage error qualified with the stage that raised it, as published
/// on the shared error channel.
#[derive(Debug)]
pub struct PipelineError {
    pub stage: &'static str,
    pub error: StageError,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
