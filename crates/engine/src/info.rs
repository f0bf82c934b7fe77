// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Info stage: project metadata from the extracted tree.
//!
//! Counts files and bytes, tallies extensions, and reads WordPress-style
//! headers to classify the project as a plugin or a theme. Missing
//! metadata is not an error; the tree simply stays `unknown`.

use crate::error::StageError;
use crate::pipeline::Stage;
use crate::record::JobRecord;
use async_trait::async_trait;
use reef_adapters::source::zip::unzipped_root;
use reef_core::results::KEY_INFO;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Headers are expected near the top of the file; don't scan further.
const HEADER_SCAN_LINES: usize = 60;
const HEADER_SCAN_BYTES: usize = 8 * 1024;

/// Metadata describing the extracted project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectInfo {
    /// `plugin`, `theme`, or `unknown`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub file_count: u64,
    pub total_bytes: u64,
    /// File counts keyed by lowercase extension.
    pub extensions: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
pub struct Info;

impl Info {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for Info {
    type In = JobRecord;
    type Out = JobRecord;

    fn name(&self) -> &'static str {
        "info"
    }

    async fn process(&mut self, mut record: JobRecord) -> Result<JobRecord, StageError> {
        let files_path = record
            .files_path
            .clone()
            .ok_or(StageError::MissingPrerequisite("filesPath"))?;
        let root = unzipped_root(&files_path);
        if !root.is_dir() {
            return Err(StageError::MissingPrerequisite("filesPath"));
        }

        let info = tokio::task::spawn_blocking(move || scan_tree(&root))
            .await
            .map_err(|e| StageError::SourceAcquisition(format!("info scan failed: {e}")))?;

        tracing::info!(
            title = %record.message.title,
            kind = %info.kind,
            files = info.file_count,
            "project scanned"
        );
        record
            .results
            .insert(KEY_INFO, serde_json::to_value(&info).unwrap_or_default())?;
        Ok(record)
    }
}

fn scan_tree(root: &Path) -> ProjectInfo {
    let mut info = ProjectInfo {
        kind: "unknown".to_string(),
        ..ProjectInfo::default()
    };

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        info.file_count += 1;
        info.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "none".to_string());
        *info.extensions.entry(ext).or_insert(0) += 1;
    }

    // A theme declares itself in style.css; a plugin in any top-level
    // PHP file's header block.
    if let Some(headers) = read_headers(&root.join("style.css"), "Theme Name") {
        info.kind = "theme".to_string();
        info.name = headers.0;
        info.version = headers.1;
        return info;
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        return info;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("php") {
            continue;
        }
        if let Some(headers) = read_headers(&path, "Plugin Name") {
            info.kind = "plugin".to_string();
            info.name = headers.0;
            info.version = headers.1;
            break;
        }
    }
    info
}

/// Read the `<marker>:` and `Version:` headers from the top of a file.
/// Returns `None` when the file is missing or carries no marker.
fn read_headers(path: &Path, marker: &str) -> Option<(Option<String>, Option<String>)> {
    let bytes = std::fs::read(path).ok()?;
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(HEADER_SCAN_BYTES)]).into_owned();

    let name = header_value(&head, marker)?;
    let version = header_value(&head, "Version");
    Some((Some(name), version))
}

fn header_value(contents: &str, key: &str) -> Option<String> {
    contents.lines().take(HEADER_SCAN_LINES).find_map(|line| {
        let (field, value) = line.split_once(':')?;
        let field = field.trim_matches(|c: char| c == '*' || c == '/' || c.is_whitespace());
        if field.eq_ignore_ascii_case(key) && !value.trim().is_empty() {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;
