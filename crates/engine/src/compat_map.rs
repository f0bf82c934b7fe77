// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compat stage: normalise parsed compatibility reports into affected
//! PHP minors.
//!
//! Error-typed findings contribute to the breaking set, warning-typed
//! findings to the warning set; sniff codes outside the compatibility
//! standard contribute nothing. The compatible set is everything in the
//! catalogue not touched by either.

use crate::error::StageError;
use crate::pipeline::{ErrorSink, Stage};
use crate::record::JobRecord;
use async_trait::async_trait;
use reef_core::php::{catalogue, compat};
use reef_core::{audit_result_key, AuditResult, CompatError, CompatibleVersions, Report};

pub struct CompatMap {
    errors: ErrorSink,
}

impl CompatMap {
    pub fn new(errors: ErrorSink) -> Self {
        Self { errors }
    }
}

/// Aggregate every finding in a report into version sets.
pub fn classify_report(report: &Report) -> Result<CompatibleVersions, StageError> {
    let mut breaks: Vec<String> = Vec::new();
    let mut warns: Vec<String> = Vec::new();

    for msg in report.messages() {
        let minors = if msg.is_error() {
            compat::breaks_versions(msg)
        } else {
            compat::warning_versions(msg)
        };
        match minors {
            Ok(minors) if msg.is_error() => breaks.extend(minors),
            Ok(minors) => warns.extend(minors),
            Err(CompatError::UnknownSource(source)) => {
                tracing::debug!(%source, "skipping foreign sniff code");
            }
            Err(error) => return Err(StageError::Compat(error)),
        }
    }

    let breaks = compat::merge_versions(&[&breaks]);
    let warns = compat::merge_versions(&[&warns]);
    let affected = compat::merge_versions(&[&breaks, &warns]);
    let keys: Vec<String> = catalogue::keys().iter().map(|k| k.to_string()).collect();
    let compatible = compat::exclude_versions(&keys, &affected);

    Ok(CompatibleVersions {
        breaks_versions: breaks,
        warnings_versions: warns,
        compatible_versions: compatible,
    })
}

#[async_trait]
impl Stage for CompatMap {
    type In = JobRecord;
    type Out = JobRecord;

    fn name(&self) -> &'static str {
        "compat"
    }

    async fn process(&mut self, mut record: JobRecord) -> Result<JobRecord, StageError> {
        let pending = std::mem::take(&mut record.pending_compat);

        for audit in pending {
            let key = audit_result_key("phpcs", &audit.standard);
            if record.results.contains(&key) {
                self.errors.report(
                    self.name(),
                    StageError::ResultConflict(reef_core::ResultMapError::DuplicateKey(key)),
                );
                continue;
            }

            let result = match classify_report(&audit.report) {
                Ok(versions) => {
                    tracing::info!(
                        title = %record.message.title,
                        standard = %audit.standard,
                        breaks = ?versions.breaks_versions,
                        warns = ?versions.warnings_versions,
                        "compatibility mapped"
                    );
                    AuditResult {
                        raw_storage_key: Some(audit.raw_storage_key),
                        parsed_storage_key: Some(audit.parsed_storage_key),
                        summary: audit.summary,
                        compatible_versions: Some(versions),
                        error: None,
                    }
                }
                Err(error) => {
                    let skipped = AuditResult::skipped(error.to_string());
                    self.errors.report(self.name(), error);
                    skipped
                }
            };

            let value = serde_json::to_value(&result).unwrap_or_default();
            record.results.insert(key, value)?;
        }

        Ok(record)
    }
}

#[cfg(test)]
#[path = "compat_map_tests.rs"]
mod tests;
