// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reef-core: domain types for the reef audit pipeline.
//!
//! Pure data and reasoning: job messages, the sniffer report model, the
//! append-only result map, and the PHP version catalogue with its
//! compatibility mapper. No I/O lives here.

pub mod macros;

pub mod message;
pub mod php;
pub mod report;
pub mod results;

pub use message::{AuditKind, AuditOptions, AuditRequest, JobMessage, MessageError, SourceKind};
pub use php::catalogue;
pub use php::compat::{
    breaks_versions, exclude_versions, merge_versions, parse_message, previous_version,
    version_parts, version_window, warning_versions, CompatError, CompatRange, Compatibility,
};
pub use report::{FileReport, Report, SniffMessage, Totals};
pub use results::{
    audit_result_key, AuditResult, AuditSummary, CompatibleVersions, ResultMap, ResultMapError,
};
