// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sniffer report model.
//!
//! Mirrors the JSON report the external sniffer writes with
//! `--report=json`: run-wide totals plus per-file message lists.

use crate::results::AuditSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run-wide totals from the sniffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub warnings: u64,
    #[serde(default)]
    pub fixable: u64,
}

/// One finding attached to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SniffMessage {
    pub message: String,
    /// Dotted sniff code, e.g. `PHPCompatibility.PHP.NewKeywords.t_namespaceFound`.
    pub source: String,
    #[serde(default)]
    pub severity: u32,
    /// `ERROR` or `WARNING` as reported by the sniffer.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub line: u64,
    #[serde(default)]
    pub column: u64,
    #[serde(default)]
    pub fixable: bool,
}

impl SniffMessage {
    pub fn is_error(&self) -> bool {
        self.kind.eq_ignore_ascii_case("error")
    }

    pub fn is_warning(&self) -> bool {
        self.kind.eq_ignore_ascii_case("warning")
    }
}

/// Findings for a single scanned file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub warnings: u64,
    #[serde(default)]
    pub messages: Vec<SniffMessage>,
}

/// A full parsed sniffer report.
///
/// Files are kept in a `BTreeMap` so the parsed artifact serialises
/// deterministically regardless of the sniffer's emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub totals: Totals,
    #[serde(default)]
    pub files: BTreeMap<String, FileReport>,
}

impl Report {
    /// Iterate every message across all files.
    pub fn messages(&self) -> impl Iterator<Item = &SniffMessage> {
        self.files.values().flat_map(|file| file.messages.iter())
    }

    /// Derive the per-audit summary surfaced to the upstream API.
    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            files_scanned: self.files.len() as u64,
            errors: self.totals.errors,
            warnings: self.totals.warnings,
            fixable: self.totals.fixable,
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
