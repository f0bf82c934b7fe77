// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analyse stage: one sniffer invocation per requested audit.
//!
//! Each `phpcs` audit runs the external sniffer against the extracted
//! tree, parses the JSON report, and uploads the raw and parsed
//! artifacts. A failed audit is skipped (its error still reaches the
//! upstream API); the remaining audits and the record continue.

use crate::error::{ConfigError, StageError};
use crate::pipeline::{ErrorSink, Stage};
use crate::record::{JobRecord, PendingCompat};
use async_trait::async_trait;
use reef_adapters::source::zip::unzipped_root;
use reef_adapters::{Runner, StorageProvider};
use reef_core::results::{KEY_CHECKSUM, KEY_FILES_PATH};
use reef_core::{audit_result_key, AuditKind, AuditRequest, AuditResult, Report};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sniffer binary name handed to the runner.
const PHPCS_BIN: &str = "phpcs";

/// The compatibility standard; its parsed report feeds the mapper.
pub const COMPAT_STANDARD: &str = "phpcompatibility";

/// Default `testVersion` range when the message does not set one.
const DEFAULT_TEST_VERSION: &str = "5.2-";

/// Tool-version sets keyed by standard. An audit whose standard has no
/// entry is skipped with `MissingVersions`.
pub type StandardVersions = HashMap<String, HashMap<String, String>>;

pub struct Analyse {
    temp_root: PathBuf,
    storage: Arc<dyn StorageProvider>,
    runner: Arc<dyn Runner>,
    versions: StandardVersions,
    errors: ErrorSink,
}

impl std::fmt::Debug for Analyse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyse")
            .field("temp_root", &self.temp_root)
            .field("versions", &self.versions)
            .finish()
    }
}

enum AuditOutcome {
    Completed { key: String, result: AuditResult },
    Compat(PendingCompat),
}

impl Analyse {
    /// Validate dependencies and build the stage.
    pub fn configure(
        temp_root: PathBuf,
        storage: Arc<dyn StorageProvider>,
        runner: Arc<dyn Runner>,
        versions: StandardVersions,
        errors: ErrorSink,
    ) -> Result<Self, ConfigError> {
        if temp_root.as_os_str().is_empty() {
            return Err(ConfigError::NoTempFolder);
        }
        if versions.is_empty() {
            return Err(ConfigError::NoVersions);
        }
        Ok(Self {
            temp_root,
            storage,
            runner,
            versions,
            errors,
        })
    }

    async fn run_audit(
        &self,
        record: &JobRecord,
        audit: &AuditRequest,
        checksum: &str,
        files_path: &Path,
    ) -> Result<AuditOutcome, StageError> {
        if record.cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        let standard = &audit.options.standard;
        let Some(tool_versions) = self.versions.get(standard) else {
            return Err(StageError::MissingVersions {
                standard: standard.clone(),
            });
        };
        tracing::debug!(%standard, versions = ?tool_versions, "resolved sniffer toolchain");

        // The override replaces the standard on the command line only;
        // version resolution stays keyed by the declared standard.
        let resolved = audit
            .options
            .standard_override
            .as_deref()
            .unwrap_or(standard.as_str());
        let report_file = self
            .temp_root
            .join(format!("{checksum}-phpcs_{standard}-raw.json"));
        let basepath = unzipped_root(files_path);

        let mut args = vec![
            format!("--standard={resolved}"),
            "--report=json".to_string(),
            format!("--report-file={}", report_file.display()),
            format!("--basepath={}", basepath.display()),
            "--extensions=php".to_string(),
        ];
        let runtime_set = match (&audit.options.runtime_set, standard.as_str()) {
            (Some(set), _) => Some(set.clone()),
            (None, COMPAT_STANDARD) => Some(format!("testVersion {DEFAULT_TEST_VERSION}")),
            _ => None,
        };
        if let Some(set) = runtime_set {
            args.push("--runtime-set".to_string());
            args.extend(set.split_whitespace().map(str::to_string));
        }

        tracing::info!(title = %record.message.title, %standard, "running sniffer");
        let run = tokio::select! {
            _ = record.cancel.cancelled() => return Err(StageError::Cancelled),
            output = self.runner.run(PHPCS_BIN, &args) => output,
        };
        let output = run.map_err(|e| StageError::AuditInternal {
            standard: standard.clone(),
            exit_code: -1,
            stderr: e.to_string(),
        })?;

        // Exit 1/2 mean findings were written; anything else is a
        // sniffer failure.
        if !matches!(output.exit_code, 0 | 1 | 2) {
            let _ = tokio::fs::remove_file(&report_file).await;
            return Err(StageError::AuditInternal {
                standard: standard.clone(),
                exit_code: output.exit_code,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let raw = tokio::fs::read(&report_file)
            .await
            .map_err(|e| StageError::ReportUnreadable {
                standard: standard.clone(),
                reason: e.to_string(),
            })?;
        let _ = tokio::fs::remove_file(&report_file).await;

        let report: Report =
            serde_json::from_slice(&raw).map_err(|e| StageError::ReportUnreadable {
                standard: standard.clone(),
                reason: e.to_string(),
            })?;

        let raw_key = format!("{checksum}/phpcs_{standard}/raw.json");
        let parsed_key = format!("{checksum}/phpcs_{standard}/parsed.json");
        let upload_err = |reason: String| StageError::Upload {
            standard: standard.clone(),
            reason,
        };
        self.storage
            .upload(&raw_key, &raw)
            .await
            .map_err(|e| upload_err(e.to_string()))?;
        let parsed_bytes = serde_json::to_vec(&report).map_err(|e| upload_err(e.to_string()))?;
        self.storage
            .upload(&parsed_key, &parsed_bytes)
            .await
            .map_err(|e| upload_err(e.to_string()))?;

        let summary = report.summary();
        if standard == COMPAT_STANDARD {
            return Ok(AuditOutcome::Compat(PendingCompat {
                standard: standard.clone(),
                raw_storage_key: raw_key,
                parsed_storage_key: parsed_key,
                summary,
                report,
            }));
        }

        Ok(AuditOutcome::Completed {
            key: audit_result_key("phpcs", standard),
            result: AuditResult {
                raw_storage_key: Some(raw_key),
                parsed_storage_key: Some(parsed_key),
                summary,
                compatible_versions: None,
                error: None,
            },
        })
    }
}

#[async_trait]
impl Stage for Analyse {
    type In = JobRecord;
    type Out = JobRecord;

    fn name(&self) -> &'static str {
        "analyse"
    }

    async fn process(&mut self, mut record: JobRecord) -> Result<JobRecord, StageError> {
        let checksum = record
            .results
            .get_str(KEY_CHECKSUM)
            .map(str::to_string)
            .filter(|c| !c.is_empty())
            .ok_or(StageError::MissingPrerequisite("checksum"))?;
        let files_path = record
            .files_path
            .clone()
            .or_else(|| record.results.get_str(KEY_FILES_PATH).map(PathBuf::from))
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(StageError::MissingPrerequisite("filesPath"))?;

        for audit in record.message.audits.clone() {
            if audit.kind != AuditKind::Phpcs {
                continue;
            }
            let standard = audit.options.standard.clone();
            if standard.is_empty() {
                self.errors.report(
                    self.name(),
                    StageError::MissingVersions {
                        standard: "<unset>".to_string(),
                    },
                );
                continue;
            }

            let key = audit_result_key("phpcs", &standard);
            if record.results.contains(&key) {
                self.errors.report(
                    self.name(),
                    StageError::ResultConflict(reef_core::ResultMapError::DuplicateKey(key)),
                );
                continue;
            }

            match self.run_audit(&record, &audit, &checksum, &files_path).await {
                Ok(AuditOutcome::Completed { key, result }) => {
                    let value = serde_json::to_value(&result).unwrap_or_default();
                    record.results.insert(key, value)?;
                }
                Ok(AuditOutcome::Compat(pending)) => record.pending_compat.push(pending),
                Err(error) => {
                    let skipped = AuditResult::skipped(error.to_string());
                    let value = serde_json::to_value(&skipped).unwrap_or_default();
                    record.results.insert(key, value)?;
                    self.errors.report(self.name(), error);
                }
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
#[path = "phpcs_tests.rs"]
mod tests;
