// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compatibility-sniff normalisation.
//!
//! Interprets one sniff finding into a closed version window, then into
//! the set of catalogued minors the window touches. The recognised
//! message patterns are data, an ordered list of `(regex, rule)` pairs;
//! anything unmatched degrades to the catch-all window.

use crate::php::catalogue;
use crate::report::SniffMessage;
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompatError {
    /// The sniff code does not belong to the compatibility standard.
    #[error("unrecognised sniff source: {0}")]
    UnknownSource(String),
    /// Stepping below an `X.0` release with no declared predecessor.
    #[error("no catalogue predecessor for {0}")]
    UnknownBoundary(String),
    #[error("unparseable version: {0}")]
    BadVersion(String),
}

/// A closed `[low, high]` window of PHP versions.
///
/// `reported` preserves the version string exactly as it appeared in the
/// message (or `"all"`); `major_minor` is the normalised two-component
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatRange {
    pub low: String,
    pub high: String,
    pub reported: String,
    pub major_minor: String,
}

/// One normalised finding: the window it breaks on or warns about.
///
/// Exactly one of `breaks`/`warns` is populated, matching the finding's
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaks: Option<CompatRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warns: Option<CompatRange>,
}

static FLOOR: Lazy<Version> = Lazy::new(|| Version::new(5, 2, 0));

/// Split a version string into numeric parts; missing minor/patch
/// default to zero. `"all"` maps to zeros.
pub fn version_parts(version: &str) -> Result<(u64, u64, u64), CompatError> {
    if version == "all" {
        return Ok((0, 0, 0));
    }
    let mut parts = version.split('.');
    let mut next = |missing_ok: bool| -> Result<u64, CompatError> {
        match parts.next() {
            Some(part) => part
                .parse::<u64>()
                .map_err(|_| CompatError::BadVersion(version.to_string())),
            None if missing_ok => Ok(0),
            None => Err(CompatError::BadVersion(version.to_string())),
        }
    };
    let major = next(false)?;
    let minor = next(true)?;
    let patch = next(true)?;
    Ok((major, minor, patch))
}

/// The immediate predecessor of a version.
///
/// Floors at `5.2.0`. Within a minor this is plain patch arithmetic;
/// stepping below a `.0` patch lands on the previous minor's highest
/// catalogued patch, and stepping below an `X.0` release crosses the
/// major boundary through the catalogue table.
pub fn previous_version(version: &str) -> Result<String, CompatError> {
    if version == "all" {
        return Ok("all".to_string());
    }
    // Only supporting down to 5.2.0.
    if version == "5.2" || version == "5.2.0" {
        return Ok("5.2.0".to_string());
    }

    let (major, minor, patch) = version_parts(version)?;

    if patch > 0 {
        return Ok(format!("{major}.{minor}.{}", patch - 1));
    }

    let prev_minor = if minor > 0 {
        format!("{major}.{}", minor - 1)
    } else {
        let boundary = format!("{major}.{minor}");
        catalogue::cross_major_predecessor(&boundary)
            .ok_or(CompatError::UnknownBoundary(boundary))?
            .to_string()
    };

    catalogue::max_patch(&prev_minor)
        .map(str::to_string)
        .ok_or(CompatError::UnknownBoundary(prev_minor))
}

fn major_minor_of(version: &str) -> String {
    let mut parts = version.splitn(3, '.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) => format!("{major}.{minor}"),
        _ => "all".to_string(),
    }
}

/// Pad a version to three components for semantic comparison.
fn parse_semver(version: &str) -> Result<Version, CompatError> {
    let padded = match version.split('.').count() {
        1 => format!("{version}.0.0"),
        2 => format!("{version}.0"),
        _ => version.to_string(),
    };
    Version::parse(&padded).map_err(|_| CompatError::BadVersion(version.to_string()))
}

/// Normalise a reported version into a window.
///
/// Two-part versions widen `high` to the catalogue's max patch for that
/// minor; `low_in` overrides the default `<minor>.0` lower bound.
/// Versions below the 5.2 floor clamp the window to it, while `reported`
/// keeps the original string.
pub fn version_window(version: &str, low_in: &str) -> CompatRange {
    let vparts: Vec<&str> = version.split('.').collect();

    let mut major_minor = if vparts.len() > 1 {
        format!("{}.{}", vparts[0], vparts[1])
    } else {
        "all".to_string()
    };

    let mut high = if vparts.len() == 2 {
        catalogue::max_patch(&major_minor)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{major_minor}.0"))
    } else {
        version.to_string()
    };

    let mut low = if low_in.is_empty() {
        if major_minor == "all" {
            "all".to_string()
        } else {
            format!("{major_minor}.0")
        }
    } else if low_in.split('.').count() == 2 {
        format!("{low_in}.0")
    } else {
        low_in.to_string()
    };

    if major_minor != "all" {
        if let Ok(v) = Version::parse(&format!("{major_minor}.0")) {
            if v < *FLOOR {
                low = catalogue::PHP_FLOOR.to_string();
                high = low.clone();
                major_minor = "5.2".to_string();
            }
        }
    }

    CompatRange {
        low,
        high,
        reported: version.to_string(),
        major_minor,
    }
}

/// How a matched pattern turns its captured version into a window.
enum Rule {
    /// "... is not present in PHP version V or earlier" — `[floor, V]`.
    NotPresentOrEarlier,
    /// "... is available since V" — `[floor, predecessor(V)]`.
    AvailableSince,
    /// "removed in" / "deprecated since" V — `[V, latest]`.
    RemovedOrDeprecated,
    /// Explicit "V - W" range.
    ExplicitRange,
    /// "V and above" — `[V, latest]`.
    AndAbove,
}

static PATTERNS: Lazy<Vec<(Regex, Rule)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)not present in PHP version (\d+(?:\.\d+)*) or earlier").unwrap(),
            Rule::NotPresentOrEarlier,
        ),
        (
            Regex::new(r"(?i)available since (?:PHP )?(\d+(?:\.\d+)*)").unwrap(),
            Rule::AvailableSince,
        ),
        (
            Regex::new(r"(?i)(?:removed|deprecated) (?:in|since) PHP(?: version)? (\d+(?:\.\d+)*)")
                .unwrap(),
            Rule::RemovedOrDeprecated,
        ),
        (
            Regex::new(r"(\d+(?:\.\d+)+)\s*-\s*(\d+(?:\.\d+)+)").unwrap(),
            Rule::ExplicitRange,
        ),
        (
            Regex::new(r"(?i)(\d+(?:\.\d+)+) and above").unwrap(),
            Rule::AndAbove,
        ),
    ]
});

fn all_window() -> CompatRange {
    CompatRange {
        low: catalogue::PHP_FLOOR.to_string(),
        high: catalogue::PHP_LATEST.to_string(),
        reported: "all".to_string(),
        major_minor: "all".to_string(),
    }
}

/// Lower bound for a reported version: pad two-part versions with `.0`
/// and clamp anything below the floor.
fn low_bound(version: &str) -> String {
    let padded = match version.split('.').count() {
        1 => format!("{version}.0.0"),
        2 => format!("{version}.0"),
        _ => version.to_string(),
    };
    match Version::parse(&padded) {
        Ok(v) if v < *FLOOR => catalogue::PHP_FLOOR.to_string(),
        _ => padded,
    }
}

/// Upper bound for a reported version: two-part versions take the
/// catalogue's max patch for that minor.
fn high_bound(version: &str) -> String {
    if version.split('.').count() == 2 {
        catalogue::max_patch(version)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{version}.0"))
    } else {
        version.to_string()
    }
}

/// Extract the version window from a finding's message text.
fn message_window(text: &str) -> Result<CompatRange, CompatError> {
    for (pattern, rule) in PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let version = caps
            .get(1)
            .map(|m| m.as_str())
            .ok_or_else(|| CompatError::BadVersion(text.to_string()))?;

        return Ok(match rule {
            Rule::NotPresentOrEarlier => version_window(version, catalogue::PHP_FLOOR),
            Rule::AvailableSince => CompatRange {
                low: catalogue::PHP_FLOOR.to_string(),
                high: previous_version(version)?,
                reported: version.to_string(),
                major_minor: major_minor_of(version),
            },
            Rule::RemovedOrDeprecated => CompatRange {
                low: low_bound(version),
                high: catalogue::PHP_LATEST.to_string(),
                reported: version.to_string(),
                major_minor: major_minor_of(version),
            },
            Rule::ExplicitRange => {
                let upper = caps
                    .get(2)
                    .map(|m| m.as_str())
                    .ok_or_else(|| CompatError::BadVersion(text.to_string()))?;
                CompatRange {
                    low: low_bound(version),
                    high: high_bound(upper),
                    reported: format!("{version} - {upper}"),
                    major_minor: major_minor_of(version),
                }
            }
            Rule::AndAbove => CompatRange {
                low: low_bound(version),
                high: catalogue::PHP_LATEST.to_string(),
                reported: version.to_string(),
                major_minor: major_minor_of(version),
            },
        });
    }

    Ok(all_window())
}

/// Normalise one finding into its compatibility window.
///
/// Sources outside the compatibility standard are unrecognised and
/// contribute nothing. Error-typed findings populate `breaks`;
/// everything else populates `warns`.
pub fn parse_message(msg: &SniffMessage) -> Result<Compatibility, CompatError> {
    if !msg.source.starts_with("PHPCompatibility.") {
        return Err(CompatError::UnknownSource(msg.source.clone()));
    }

    let range = message_window(&msg.message)?;
    let mut compat = Compatibility {
        source: msg.source.clone(),
        breaks: None,
        warns: None,
    };
    if msg.is_error() {
        compat.breaks = Some(range);
    } else {
        compat.warns = Some(range);
    }
    Ok(compat)
}

/// The catalogued minors whose max patch falls inside a window.
fn affected_minors(range: &CompatRange) -> Result<Vec<String>, CompatError> {
    let (low, high) = if range.reported == "all" {
        (
            catalogue::PHP_FLOOR.to_string(),
            catalogue::PHP_LATEST.to_string(),
        )
    } else {
        (range.low.clone(), range.high.clone())
    };
    let low = parse_semver(&low)?;
    let high = parse_semver(&high)?;

    let mut minors = Vec::new();
    for minor in catalogue::keys() {
        let Some(max) = catalogue::max_patch(minor) else {
            continue;
        };
        let probe = parse_semver(max)?;
        if low <= probe && probe <= high {
            minors.push(minor.to_string());
        }
    }
    Ok(minors)
}

/// Minors an error-typed finding breaks on. Empty for non-errors.
pub fn breaks_versions(msg: &SniffMessage) -> Result<Vec<String>, CompatError> {
    if !msg.is_error() {
        return Ok(Vec::new());
    }
    let compat = parse_message(msg)?;
    match compat.breaks {
        Some(range) => affected_minors(&range),
        None => Ok(Vec::new()),
    }
}

/// Minors a warning-typed finding warns about. Empty for non-warnings.
pub fn warning_versions(msg: &SniffMessage) -> Result<Vec<String>, CompatError> {
    if !msg.is_warning() {
        return Ok(Vec::new());
    }
    let compat = parse_message(msg)?;
    match compat.warns {
        Some(range) => affected_minors(&range),
        None => Ok(Vec::new()),
    }
}

/// Union of version lists: sorted ascending, de-duplicated.
pub fn merge_versions(lists: &[&[String]]) -> Vec<String> {
    let mut merged: Vec<String> = lists.iter().flat_map(|list| list.iter().cloned()).collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}

/// Elements of `versions` not in `exclude`: sorted, de-duplicated.
pub fn exclude_versions(versions: &[String], exclude: &[String]) -> Vec<String> {
    let mut included: Vec<String> = versions
        .iter()
        .filter(|version| !exclude.contains(version))
        .cloned()
        .collect();
    included.sort_unstable();
    included.dedup();
    included
}

#[cfg(test)]
#[path = "compat_tests.rs"]
mod tests;
