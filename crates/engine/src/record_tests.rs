// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the job record.

use crate::record::{InFlight, JobRecord};
use reef_core::{JobMessage, SourceKind};
use tokio_util::sync::CancellationToken;

fn message() -> JobMessage {
    JobMessage {
        title: "Dummy Plugin".to_string(),
        slug: "dummy-plugin".to_string(),
        source_url: "https://downloads.example.test/dummy-plugin.zip".to_string(),
        source_type: SourceKind::Zip,
        response_endpoint: "https://api.example.test/audit".to_string(),
        audits: Vec::new(),
    }
}

#[test]
fn in_flight_counts_live_records() {
    let in_flight = InFlight::new();
    assert_eq!(in_flight.count(), 0);

    let first = JobRecord::new(message(), CancellationToken::new(), &in_flight);
    let second = JobRecord::new(message(), CancellationToken::new(), &in_flight);
    assert_eq!(in_flight.count(), 2);

    drop(first);
    assert_eq!(in_flight.count(), 1);
    drop(second);
    assert_eq!(in_flight.count(), 0);
}

#[test]
fn releasing_a_record_purges_its_extraction_dir() {
    let temp = tempfile::tempdir().unwrap();
    let extraction = temp.path().join("audit-abc");
    std::fs::create_dir_all(extraction.join("unzipped")).unwrap();
    std::fs::write(extraction.join("unzipped/plugin.php"), "<?php").unwrap();

    let in_flight = InFlight::new();
    let mut record = JobRecord::new(message(), CancellationToken::new(), &in_flight);
    record.arm_cleanup(extraction.clone());

    drop(record);
    assert!(!extraction.exists());
    // The temp root itself survives.
    assert!(temp.path().exists());
}

#[test]
fn unarmed_records_touch_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let in_flight = InFlight::new();
    let record = JobRecord::new(message(), CancellationToken::new(), &in_flight);
    drop(record);
    assert!(temp.path().exists());
}

#[test]
fn result_map_grows_monotonically_on_the_record() {
    let in_flight = InFlight::new();
    let mut record = JobRecord::new(message(), CancellationToken::new(), &in_flight);

    record
        .results
        .insert("checksum", serde_json::json!("abc"))
        .unwrap();
    assert!(record
        .results
        .insert("checksum", serde_json::json!("def"))
        .is_err());
    assert_eq!(record.results.get_str("checksum"), Some("abc"));
}
