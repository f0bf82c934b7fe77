// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only result map and per-audit result shapes.
//!
//! The result map rides on a job record through the pipeline. Each stage
//! writes its own keys and only ever reads keys written upstream, so the
//! map grows monotonically: `insert` refuses to overwrite.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved result key: the project checksum written by ingest.
pub const KEY_CHECKSUM: &str = "checksum";
/// Reserved result key: the extracted file manifest written by ingest.
pub const KEY_FILES: &str = "files";
/// Reserved result key: the extraction root written by ingest.
pub const KEY_FILES_PATH: &str = "filesPath";
/// Reserved result key: project metadata written by the info stage.
pub const KEY_INFO: &str = "info";

/// Prefix shared by every per-audit result key.
pub const AUDIT_KEY_PREFIX: &str = "audit.";

/// Result key for one completed audit, e.g. `audit.phpcs.wordpress`.
pub fn audit_result_key(kind: &str, standard: &str) -> String {
    format!("{AUDIT_KEY_PREFIX}{kind}.{standard}")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResultMapError {
    #[error("result key already written: {0}")]
    DuplicateKey(String),
}

/// String-keyed map of stage outputs, append-only within one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultMap(BTreeMap<String, Value>);

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Existing keys are never replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), ResultMapError> {
        let key = key.into();
        if self.0.contains_key(&key) {
            return Err(ResultMapError::DuplicateKey(key));
        }
        self.0.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Convenience accessor for string-valued keys.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The per-audit entries (`audit.*` keys) as their own JSON object,
    /// for the response payload's `audits` member.
    pub fn audit_results(&self) -> serde_json::Map<String, Value> {
        self.0
            .iter()
            .filter(|(key, _)| key.starts_with(AUDIT_KEY_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Per-audit summary surfaced to the upstream API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub files_scanned: u64,
    pub errors: u64,
    pub warnings: u64,
    pub fixable: u64,
}

/// Version classification for one compatibility audit.
///
/// All three lists hold `major.minor` catalogue keys, sorted ascending
/// and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibleVersions {
    pub breaks_versions: Vec<String>,
    pub warnings_versions: Vec<String>,
    pub compatible_versions: Vec<String>,
}

/// Outcome of one audit, written exactly once per completed audit.
///
/// A skipped audit carries `error` and no storage keys, so the upstream
/// API still learns why the audit produced nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_storage_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_storage_key: Option<String>,
    #[serde(default)]
    pub summary: AuditSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_versions: Option<CompatibleVersions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditResult {
    /// A result describing a skipped audit.
    pub fn skipped(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
