// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the compatibility mapper.

use crate::php::catalogue;
use crate::php::compat::{
    breaks_versions, exclude_versions, merge_versions, parse_message, previous_version,
    version_parts, version_window, warning_versions, CompatError,
};
use crate::report::SniffMessage;

fn sniff(source: &str, kind: &str, message: &str) -> SniffMessage {
    SniffMessage {
        message: message.to_string(),
        source: source.to_string(),
        severity: 5,
        kind: kind.to_string(),
        line: 1,
        column: 1,
        fixable: false,
    }
}

fn keys() -> Vec<String> {
    catalogue::keys().iter().map(|k| k.to_string()).collect()
}

// ----------------------------------------------------------------------------
// previous_version
// ----------------------------------------------------------------------------

#[test]
fn predecessor_within_a_minor_decrements_the_patch() {
    assert_eq!(previous_version("7.2.5").unwrap(), "7.2.4");
    assert_eq!(previous_version("5.3.1").unwrap(), "5.3.0");
}

#[test]
fn predecessor_of_patch_zero_is_previous_minors_max() {
    assert_eq!(previous_version("5.4").unwrap(), "5.3.29");
    assert_eq!(previous_version("5.4.0").unwrap(), "5.3.29");
    assert_eq!(previous_version("7.1.0").unwrap(), "7.0.33");
}

#[test]
fn predecessor_crosses_the_major_boundary_through_the_table() {
    assert_eq!(previous_version("7.0").unwrap(), "5.6.40");
    assert_eq!(previous_version("7.0.0").unwrap(), "5.6.40");
}

#[test]
fn predecessor_floors_at_5_2_0() {
    assert_eq!(previous_version("5.2").unwrap(), "5.2.0");
    assert_eq!(previous_version("5.2.0").unwrap(), "5.2.0");
}

#[test]
fn predecessor_of_all_is_all() {
    assert_eq!(previous_version("all").unwrap(), "all");
}

#[test]
fn predecessor_of_an_undeclared_boundary_errors() {
    assert_eq!(
        previous_version("8.0"),
        Err(CompatError::UnknownBoundary("8.0".into()))
    );
}

#[test]
fn predecessor_round_trip_lands_on_previous_minor() {
    // Applying predecessor patch+1 times from X.Y.Z walks down to the
    // predecessor of X.Y.0.
    let mut version = "5.4.3".to_string();
    for _ in 0..4 {
        version = previous_version(&version).unwrap();
    }
    assert_eq!(version, previous_version("5.4.0").unwrap());
}

// ----------------------------------------------------------------------------
// version_parts / version_window
// ----------------------------------------------------------------------------

#[test]
fn parts_default_missing_components_to_zero() {
    assert_eq!(version_parts("7.1.3").unwrap(), (7, 1, 3));
    assert_eq!(version_parts("5.6").unwrap(), (5, 6, 0));
    assert_eq!(version_parts("all").unwrap(), (0, 0, 0));
    assert!(version_parts("banana").is_err());
}

#[test]
fn window_widens_two_part_versions_to_the_max_patch() {
    let range = version_window("5.3", "");
    assert_eq!(range.low, "5.3.0");
    assert_eq!(range.high, "5.3.29");
    assert_eq!(range.major_minor, "5.3");
    assert_eq!(range.reported, "5.3");
}

#[test]
fn window_keeps_three_part_versions_verbatim() {
    let range = version_window("7.0.12", "5.6");
    assert_eq!(range.low, "5.6.0");
    assert_eq!(range.high, "7.0.12");
    assert_eq!(range.major_minor, "7.0");
}

#[test]
fn window_clamps_below_the_floor_but_reports_the_original() {
    let range = version_window("5.1", "");
    assert_eq!(range.low, "5.2.0");
    assert_eq!(range.high, "5.2.0");
    assert_eq!(range.major_minor, "5.2");
    // Tail write: the reported string survives the clamp.
    assert_eq!(range.reported, "5.1");
}

// ----------------------------------------------------------------------------
// scenario coverage
// ----------------------------------------------------------------------------

#[test]
fn new_keyword_error_breaks_5_2_only() {
    // The namespace keyword arrived in 5.3.
    let msg = sniff(
        "PHPCompatibility.PHP.NewKeywords.t_namespaceFound",
        "ERROR",
        "\"namespace\" keyword is not present in PHP version 5.2 or earlier",
    );
    assert_eq!(breaks_versions(&msg).unwrap(), vec!["5.2"]);
    assert!(warning_versions(&msg).unwrap().is_empty());
}

#[test]
fn available_since_breaks_everything_before_the_release() {
    // Short array syntax arrived in 5.4.
    let msg = sniff(
        "PHPCompatibility.PHP.ShortArray.Found",
        "ERROR",
        "Short array syntax (open) is available since 5.4",
    );
    assert_eq!(breaks_versions(&msg).unwrap(), vec!["5.2", "5.3"]);
}

#[test]
fn trait_keyword_breaks_up_to_5_3() {
    // The trait keyword arrived in 5.4.
    let msg = sniff(
        "PHPCompatibility.PHP.NewKeywords.t_traitFound",
        "ERROR",
        "\"trait\" keyword is not present in PHP version 5.3 or earlier",
    );
    assert_eq!(breaks_versions(&msg).unwrap(), vec!["5.2", "5.3"]);
}

#[test]
fn unparseable_version_breaks_every_catalogued_minor() {
    // Nothing extractable degrades to the catch-all window.
    let msg = sniff(
        "PHPCompatibility.PHP.Something.Found",
        "ERROR",
        "This construct misbehaves in unspecified ways",
    );
    assert_eq!(breaks_versions(&msg).unwrap(), keys());
}

#[test]
fn warning_populates_warns_not_breaks() {
    // Same message shape as the error case, warning-typed.
    let msg = sniff(
        "PHPCompatibility.PHP.NewKeywords.t_namespaceFound",
        "WARNING",
        "\"namespace\" keyword is not present in PHP version 5.2 or earlier",
    );
    assert!(breaks_versions(&msg).unwrap().is_empty());
    assert_eq!(warning_versions(&msg).unwrap(), vec!["5.2"]);
}

#[test]
fn removed_in_affects_the_release_and_everything_after() {
    let msg = sniff(
        "PHPCompatibility.PHP.RemovedFunctions.ereg",
        "ERROR",
        "Function ereg() is removed in PHP version 7.0",
    );
    assert_eq!(
        breaks_versions(&msg).unwrap(),
        vec!["7.0", "7.1", "7.2", "7.3"]
    );
}

#[test]
fn deprecated_since_warns_from_the_release_on() {
    let msg = sniff(
        "PHPCompatibility.PHP.DeprecatedFunctions.split",
        "WARNING",
        "Function split() is deprecated since PHP version 5.3",
    );
    assert_eq!(
        warning_versions(&msg).unwrap(),
        vec!["5.3", "5.4", "5.5", "5.6", "7.0", "7.1", "7.2", "7.3"]
    );
}

#[test]
fn explicit_range_bounds_both_sides() {
    let msg = sniff(
        "PHPCompatibility.PHP.Something.Found",
        "ERROR",
        "Behaviour differs in PHP 5.4 - 5.6",
    );
    assert_eq!(breaks_versions(&msg).unwrap(), vec!["5.4", "5.5", "5.6"]);
}

#[test]
fn exclusivity_breaks_xor_warns() {
    let error = sniff(
        "PHPCompatibility.PHP.NewKeywords.t_namespaceFound",
        "ERROR",
        "\"namespace\" keyword is not present in PHP version 5.2 or earlier",
    );
    let parsed = parse_message(&error).unwrap();
    assert!(parsed.breaks.is_some());
    assert!(parsed.warns.is_none());

    let warning = sniff(
        "PHPCompatibility.PHP.NewKeywords.t_namespaceFound",
        "WARNING",
        "\"namespace\" keyword is not present in PHP version 5.2 or earlier",
    );
    let parsed = parse_message(&warning).unwrap();
    assert!(parsed.breaks.is_none());
    assert!(parsed.warns.is_some());
}

#[test]
fn foreign_sniff_codes_are_unrecognised() {
    let msg = sniff(
        "WordPress.Files.FileName.InvalidClassFileName",
        "ERROR",
        "Class file names should be based on the class name",
    );
    assert!(matches!(
        parse_message(&msg),
        Err(CompatError::UnknownSource(_))
    ));
}

// ----------------------------------------------------------------------------
// set combinators
// ----------------------------------------------------------------------------

#[test]
fn merge_unions_sorts_and_dedups() {
    let a = vec!["5.2".to_string(), "5.3".to_string()];
    let b = vec!["5.3".to_string(), "5.4".to_string()];
    assert_eq!(merge_versions(&[&a, &b]), vec!["5.2", "5.3", "5.4"]);
}

#[test]
fn exclude_removes_blocked_versions() {
    let blocked = vec!["5.2".to_string(), "5.3".to_string()];
    assert_eq!(
        exclude_versions(&keys(), &blocked),
        vec!["5.4", "5.5", "5.6", "7.0", "7.1", "7.2", "7.3"]
    );
}

#[test]
fn combinator_outputs_are_strictly_ascending() {
    let a = vec!["7.0".to_string(), "5.2".to_string(), "7.0".to_string()];
    let b = vec!["5.6".to_string()];
    let merged = merge_versions(&[&a, &b]);
    assert!(merged.windows(2).all(|w| w[0] < w[1]));

    let excluded = exclude_versions(&a, &b);
    assert!(excluded.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn breaks_warns_and_compatible_cover_the_catalogue() {
    // Coverage: merge(breaks, warns, compatible) == catalogue keys.
    let breaks = vec!["5.2".to_string(), "5.3".to_string()];
    let warns = vec!["7.3".to_string()];
    let affected = merge_versions(&[&breaks, &warns]);
    let compatible = exclude_versions(&keys(), &affected);
    assert_eq!(merge_versions(&[&breaks, &warns, &compatible]), keys());
}
