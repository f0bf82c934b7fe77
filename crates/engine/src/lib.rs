// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reef-engine: the staged audit pipeline.
//!
//! A linear chain of long-lived stage workers linked by bounded
//! channels: ingest, info, analyse, compat, respond. Each worker reads a
//! job record, does its work, grows the record's result map, and
//! forwards the record; recoverable failures go to a shared error
//! channel and the worker keeps going.

pub mod compat_map;
pub mod error;
pub mod info;
pub mod ingest;
pub mod phpcs;
pub mod pipeline;
pub mod record;
pub mod respond;
pub mod run;

pub use compat_map::{classify_report, CompatMap};
pub use error::{ConfigError, PipelineError, StageError};
pub use info::{Info, ProjectInfo};
pub use ingest::Ingest;
pub use phpcs::{Analyse, StandardVersions, COMPAT_STANDARD};
pub use pipeline::{spawn_stage, ErrorSink, Stage, DEFAULT_CHANNEL_CAPACITY};
pub use record::{InFlight, JobRecord, PendingCompat};
pub use respond::Respond;
pub use run::{Pipeline, PipelineConfig, PipelineDeps};
