// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end pipeline test: one job message through all five stages,
//! with fake adapters standing in for the network, the sniffer, and the
//! object store.

use reef_adapters::{FakeResponseClient, FakeRunner, FakeSources, FakeStorage, ScriptedRun};
use reef_core::{catalogue, JobMessage};
use reef_engine::{Pipeline, PipelineConfig, PipelineDeps, StandardVersions};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Two bounded keyword errors plus an unbounded one: together they
/// break every catalogued minor.
const COMPAT_REPORT: &str = r#"{"totals":{"errors":3,"warnings":0,"fixable":0},"files":{"compatissues.php":{"errors":3,"warnings":0,"messages":[{"message":"\"namespace\" keyword is not present in PHP version 5.2 or earlier","source":"PHPCompatibility.PHP.NewKeywords.t_namespaceFound","severity":5,"type":"ERROR","line":3,"column":1,"fixable":false},{"message":"\"trait\" keyword is not present in PHP version 5.3 or earlier","source":"PHPCompatibility.PHP.NewKeywords.t_traitFound","severity":5,"type":"ERROR","line":8,"column":1,"fixable":false},{"message":"This construct misbehaves in unspecified ways","source":"PHPCompatibility.PHP.Mystery.Found","severity":5,"type":"ERROR","line":9,"column":9,"fixable":false}]},"dummy-plugin.php":{"errors":0,"warnings":0,"messages":[]}}}"#;

fn versions() -> StandardVersions {
    let mut table = StandardVersions::new();
    table.insert(
        "phpcompatibility".to_string(),
        HashMap::from([("phpcs".to_string(), "3.3.1".to_string())]),
    );
    table
}

fn message() -> JobMessage {
    serde_json::from_value(json!({
        "title": "Dummy Plugin",
        "slug": "dummy-plugin",
        "source_url": "https://downloads.example.test/dummy-plugin.zip",
        "source_type": "zip",
        "response_endpoint": "https://api.example.test/audit/dummy-plugin",
        "audits": [ { "type": "phpcs", "options": {
            "standard": "phpcompatibility",
            "runtime_set": "testVersion 5.2-"
        } } ]
    }))
    .unwrap()
}

#[tokio::test]
async fn one_job_traverses_every_stage() {
    let temp = tempfile::tempdir().unwrap();

    let sources = Arc::new(FakeSources::new(vec![
        (
            "dummy-plugin.php".to_string(),
            "<?php\n/*\nPlugin Name: Dummy Plugin\nVersion: 0.1.0\n*/\n".to_string(),
        ),
        (
            "compatissues.php".to_string(),
            "<?php\nnamespace Dummy;\n".to_string(),
        ),
    ]));
    let runner = FakeRunner::new();
    runner.push(ScriptedRun::with_report(COMPAT_REPORT));
    let storage = FakeStorage::new();
    let response = FakeResponseClient::new();

    let pipeline = Pipeline::configure(
        PipelineConfig {
            temp_root: temp.path().to_path_buf(),
            versions: versions(),
            channel_capacity: 2,
        },
        PipelineDeps {
            sources,
            storage: Arc::new(storage.clone()),
            runner: Arc::new(runner.clone()),
            response: Arc::new(response.clone()),
        },
    )
    .unwrap();

    assert!(pipeline.feed(message()).await);
    pipeline.drain().await;

    // One post, carrying the assembled result record.
    let posts = response.posts();
    assert_eq!(posts.len(), 1);
    let body = &posts[0].body;
    assert_eq!(body["title"], "Dummy Plugin");
    assert_eq!(body["slug"], "dummy-plugin");

    let checksum = body["checksum"].as_str().unwrap();
    assert!(!checksum.is_empty());
    assert!(!body["files"].as_array().unwrap().is_empty());
    assert!(!body["filesPath"].as_str().unwrap().is_empty());
    assert_eq!(body["info"]["kind"], "plugin");

    let audit = &body["audits"]["audit.phpcs.phpcompatibility"];
    let expected_keys: Vec<&str> = catalogue::keys();
    assert_eq!(
        audit["compatible_versions"]["breaks_versions"],
        json!(expected_keys)
    );
    assert_eq!(audit["compatible_versions"]["warnings_versions"], json!([]));
    assert_eq!(
        audit["compatible_versions"]["compatible_versions"],
        json!([])
    );
    assert_eq!(audit["summary"]["errors"], 3);

    // Raw and parsed artifacts reached storage under the checksum.
    let keys = storage.keys();
    assert_eq!(
        keys,
        vec![
            format!("{checksum}/phpcs_phpcompatibility/parsed.json"),
            format!("{checksum}/phpcs_phpcompatibility/raw.json"),
        ]
    );

    // The extraction directory was purged when the record was released.
    assert!(std::fs::read_dir(temp.path())
        .unwrap()
        .filter_map(Result::ok)
        .next()
        .is_none());
}

#[tokio::test]
async fn shutdown_reports_abandoned_jobs() {
    let temp = tempfile::tempdir().unwrap();

    // A runner that never finishes keeps the job in flight.
    struct StuckRunner;
    #[async_trait::async_trait]
    impl reef_adapters::Runner for StuckRunner {
        async fn run(
            &self,
            _name: &str,
            _args: &[String],
        ) -> Result<reef_adapters::RunOutput, reef_adapters::RunnerError> {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    }

    let sources = Arc::new(FakeSources::new(vec![(
        "plugin.php".to_string(),
        "<?php".to_string(),
    )]));
    let response = FakeResponseClient::new();

    let pipeline = Pipeline::configure(
        PipelineConfig {
            temp_root: temp.path().to_path_buf(),
            versions: versions(),
            channel_capacity: 2,
        },
        PipelineDeps {
            sources,
            storage: Arc::new(FakeStorage::new()),
            runner: Arc::new(StuckRunner),
            response: Arc::new(response.clone()),
        },
    )
    .unwrap();

    assert!(pipeline.feed(message()).await);

    // Wait until the record reaches the stuck sniffer invocation.
    let tracker = pipeline.in_flight_tracker();
    for _ in 0..200 {
        if tracker.count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(tracker.count(), 1);

    let abandoned = pipeline.shutdown().await;
    assert_eq!(abandoned, 1);
    assert!(response.posts().is_empty());
    assert_eq!(tracker.count(), 0);
}
