// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PHP release catalogue.
//!
//! Immutable after process start. Every catalogued minor maps to its
//! highest released patch; that patch is the probe point for all window
//! reasoning, because sniff messages say nothing about patch levels.

/// Highest released patch of the newest catalogued minor.
pub const PHP_LATEST: &str = "7.3.8";

/// Lower bound of the catalogue; nothing below 5.2.0 is reasoned about.
pub const PHP_FLOOR: &str = "5.2.0";

/// Catalogued minors in ascending order, each with its max patch.
const MINORS: &[(&str, &str)] = &[
    ("5.2", "5.2.17"),
    ("5.3", "5.3.29"),
    ("5.4", "5.4.45"),
    ("5.5", "5.5.38"),
    ("5.6", "5.6.40"),
    ("7.0", "7.0.33"),
    ("7.1", "7.1.31"),
    ("7.2", "7.2.21"),
    ("7.3", "7.3.8"),
];

/// All catalogued `major.minor` keys, ascending.
pub fn keys() -> Vec<&'static str> {
    MINORS.iter().map(|(minor, _)| *minor).collect()
}

/// Highest released patch for a catalogued minor.
pub fn max_patch(minor: &str) -> Option<&'static str> {
    MINORS
        .iter()
        .find(|(key, _)| *key == minor)
        .map(|(_, max)| *max)
}

/// Cross-major predecessor table.
///
/// Stepping below an `X.0` release crosses a major boundary; the minor
/// it lands on is declared here, not computed. Extending the catalogue
/// past 7.3 means adding an entry, never new code.
pub fn cross_major_predecessor(minor: &str) -> Option<&'static str> {
    match minor {
        "7.0" => Some("5.6"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "catalogue_tests.rs"]
mod tests;
