// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sniffer versions table: which toolchain backs each standard.
//!
//! Loaded from a JSON file (`{ "<standard>": { "<tool>": "<version>" } }`)
//! when one is configured, otherwise the built-in table.

use anyhow::{Context, Result};
use reef_engine::StandardVersions;
use std::collections::HashMap;
use std::path::Path;

/// Built-in toolchain table covering the two stock standards.
pub fn default_versions() -> StandardVersions {
    let mut table = StandardVersions::new();
    table.insert(
        "wordpress".to_string(),
        HashMap::from([
            ("phpcs".to_string(), "3.3.1".to_string()),
            ("wpcs".to_string(), "1.1.0".to_string()),
        ]),
    );
    table.insert(
        "phpcompatibility".to_string(),
        HashMap::from([
            ("phpcs".to_string(), "3.3.1".to_string()),
            ("phpcompatibility".to_string(), "8.2.0".to_string()),
            ("phpcompatibilitywp".to_string(), "2.0.0".to_string()),
        ]),
    );
    table
}

/// Load the versions table from `path`, or fall back to the built-in.
pub fn load(path: Option<&Path>) -> Result<StandardVersions> {
    let Some(path) = path else {
        return Ok(default_versions());
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read versions file {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse versions file {}", path.display()))
}

#[cfg(test)]
#[path = "versions_tests.rs"]
mod tests;
