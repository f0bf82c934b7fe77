// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the compat stage.

use crate::compat_map::{classify_report, CompatMap};
use crate::error::StageError;
use crate::pipeline::{ErrorSink, Stage};
use crate::record::{InFlight, JobRecord, PendingCompat};
use reef_core::php::catalogue;
use reef_core::{AuditSummary, JobMessage, Report, SourceKind};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn report_of(messages: Vec<serde_json::Value>) -> Report {
    serde_json::from_value(json!({
        "totals": { "errors": 0, "warnings": 0, "fixable": 0 },
        "files": { "compatissues.php": {
            "errors": 0, "warnings": 0, "messages": messages
        } }
    }))
    .unwrap()
}

fn finding(source: &str, kind: &str, message: &str) -> serde_json::Value {
    json!({
        "message": message,
        "source": source,
        "severity": 5,
        "type": kind,
        "line": 1,
        "column": 1,
        "fixable": false
    })
}

fn keys() -> Vec<String> {
    catalogue::keys().iter().map(|k| k.to_string()).collect()
}

fn record() -> JobRecord {
    let msg = JobMessage {
        title: "Valid Phpcompat".to_string(),
        slug: "test".to_string(),
        source_url: "https://downloads.example.test/test.zip".to_string(),
        source_type: SourceKind::Zip,
        response_endpoint: "https://api.example.test/audit".to_string(),
        audits: Vec::new(),
    };
    JobRecord::new(msg, CancellationToken::new(), &InFlight::new())
}

fn pending(report: Report) -> PendingCompat {
    PendingCompat {
        standard: "phpcompatibility".to_string(),
        raw_storage_key: "sum/phpcs_phpcompatibility/raw.json".to_string(),
        parsed_storage_key: "sum/phpcs_phpcompatibility/parsed.json".to_string(),
        summary: AuditSummary {
            files_scanned: 1,
            errors: 3,
            warnings: 0,
            fixable: 0,
        },
        report,
    }
}

#[test]
fn classifies_the_full_catalogue_when_a_finding_is_unbounded() {
    // Two bounded keyword errors plus one unparseable error.
    let report = report_of(vec![
        finding(
            "PHPCompatibility.PHP.NewKeywords.t_namespaceFound",
            "ERROR",
            "\"namespace\" keyword is not present in PHP version 5.2 or earlier",
        ),
        finding(
            "PHPCompatibility.PHP.NewKeywords.t_traitFound",
            "ERROR",
            "\"trait\" keyword is not present in PHP version 5.3 or earlier",
        ),
        finding(
            "PHPCompatibility.PHP.Mystery.Found",
            "ERROR",
            "Something is off in ways this message does not say",
        ),
    ]);

    let versions = classify_report(&report).unwrap();
    assert_eq!(versions.breaks_versions, keys());
    assert!(versions.warnings_versions.is_empty());
    assert!(versions.compatible_versions.is_empty());
}

#[test]
fn splits_errors_and_warnings() {
    let report = report_of(vec![
        finding(
            "PHPCompatibility.PHP.ShortArray.Found",
            "ERROR",
            "Short array syntax (open) is available since 5.4",
        ),
        finding(
            "PHPCompatibility.PHP.DeprecatedFunctions.split",
            "WARNING",
            "Function split() is deprecated since PHP version 7.0",
        ),
    ]);

    let versions = classify_report(&report).unwrap();
    assert_eq!(versions.breaks_versions, vec!["5.2", "5.3"]);
    assert_eq!(
        versions.warnings_versions,
        vec!["7.0", "7.1", "7.2", "7.3"]
    );
    assert_eq!(
        versions.compatible_versions,
        vec!["5.4", "5.5", "5.6"]
    );

    // Coverage: the three sets partition the catalogue.
    let all = reef_core::merge_versions(&[
        &versions.breaks_versions,
        &versions.warnings_versions,
        &versions.compatible_versions,
    ]);
    assert_eq!(all, keys());
}

#[test]
fn foreign_sniff_codes_contribute_nothing() {
    let report = report_of(vec![finding(
        "WordPress.Files.FileName.InvalidClassFileName",
        "ERROR",
        "Class file names should be based on the class name",
    )]);

    let versions = classify_report(&report).unwrap();
    assert!(versions.breaks_versions.is_empty());
    assert!(versions.warnings_versions.is_empty());
    assert_eq!(versions.compatible_versions, keys());
}

#[test]
fn undeclared_boundary_fails_the_classification() {
    let report = report_of(vec![finding(
        "PHPCompatibility.PHP.NewFunctions.future",
        "ERROR",
        "Function future_fn() is available since 8.0",
    )]);

    assert!(matches!(
        classify_report(&report),
        Err(StageError::Compat(_))
    ));
}

#[tokio::test]
async fn stage_writes_the_compat_audit_result() {
    let (err_tx, mut err_rx) = mpsc::channel(4);
    let mut stage = CompatMap::new(ErrorSink::new(err_tx));

    let report = report_of(vec![finding(
        "PHPCompatibility.PHP.ShortArray.Found",
        "ERROR",
        "Short array syntax (open) is available since 5.4",
    )]);
    let mut record = record();
    record.pending_compat.push(pending(report));

    let record = stage.process(record).await.unwrap();
    assert!(record.pending_compat.is_empty());

    let result = record.results.get("audit.phpcs.phpcompatibility").unwrap();
    assert_eq!(
        result["raw_storage_key"],
        "sum/phpcs_phpcompatibility/raw.json"
    );
    assert_eq!(result["summary"]["errors"], 3);
    assert_eq!(
        result["compatible_versions"]["breaks_versions"],
        json!(["5.2", "5.3"])
    );
    assert_eq!(
        result["compatible_versions"]["compatible_versions"],
        json!(["5.4", "5.5", "5.6", "7.0", "7.1", "7.2", "7.3"])
    );
    assert!(err_rx.try_recv().is_err());
}

#[tokio::test]
async fn stage_skips_the_audit_on_classification_errors() {
    let (err_tx, mut err_rx) = mpsc::channel(4);
    let mut stage = CompatMap::new(ErrorSink::new(err_tx));

    let report = report_of(vec![finding(
        "PHPCompatibility.PHP.NewFunctions.future",
        "ERROR",
        "Function future_fn() is available since 8.0",
    )]);
    let mut record = record();
    record.pending_compat.push(pending(report));

    let record = stage.process(record).await.unwrap();

    let result = record.results.get("audit.phpcs.phpcompatibility").unwrap();
    assert!(result["error"].as_str().unwrap().contains("predecessor"));

    let err = err_rx.try_recv().unwrap();
    assert_eq!(err.stage, "compat");
}

#[tokio::test]
async fn records_without_pending_reports_pass_through() {
    let (err_tx, _err_rx) = mpsc::channel(4);
    let mut stage = CompatMap::new(ErrorSink::new(err_tx));

    let record = stage.process(record()).await.unwrap();
    assert!(record.results.is_empty());
}
