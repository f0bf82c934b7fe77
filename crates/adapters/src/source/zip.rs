// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Zip source manager: stream-download an archive, extract it with the
//! root prefix stripped, and hash every file along the way.

use super::{SourceError, SourceManager};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Archive filename inside the job's extraction directory.
pub const SOURCE_FILENAME: &str = "source.zip";

/// Directory the archive contents land in, below the extraction root.
pub const UNZIPPED_DIR: &str = "unzipped";

/// Zip archive fetched over HTTP.
pub struct ZipSource {
    url: String,
    http: reqwest::Client,
    files: Vec<String>,
    checksum: String,
}

impl ZipSource {
    pub fn new(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
            files: Vec::new(),
            checksum: String::new(),
        }
    }

    async fn download(&self, dest: &Path) -> Result<(), SourceError> {
        let download_err = |reason: String| SourceError::Download {
            url: self.url.clone(),
            reason,
        };

        let mut response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(download_err(format!("status {status}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| SourceError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_err(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|source| SourceError::Io {
                    path: dest.to_path_buf(),
                    source,
                })?;
        }
        file.flush().await.map_err(|source| SourceError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        tracing::debug!(url = %self.url, dest = %dest.display(), "archive downloaded");
        Ok(())
    }
}

#[async_trait]
impl SourceManager for ZipSource {
    async fn prepare_files(&mut self, dest: &Path) -> Result<(), SourceError> {
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| SourceError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        let archive_path = dest.join(SOURCE_FILENAME);
        self.download(&archive_path).await?;

        let out_dir = dest.join(UNZIPPED_DIR);
        let (files, digests) =
            tokio::task::spawn_blocking(move || unzip(&archive_path, &out_dir))
                .await
                .map_err(|e| SourceError::Archive {
                    path: dest.to_path_buf(),
                    reason: format!("extraction task failed: {e}"),
                })??;

        if !files.is_empty() {
            self.checksum = combined_checksum(&digests);
        }
        self.files = files;
        Ok(())
    }

    fn checksum(&self) -> &str {
        &self.checksum
    }

    fn files(&self) -> &[String] {
        &self.files
    }
}

/// Shortest directory entry that is an ancestor of every file entry.
///
/// Archives built from a single top-level folder have that folder as
/// their root prefix; flat archives have none.
fn root_prefix(names: &[String]) -> String {
    let files: Vec<&String> = names.iter().filter(|n| !n.ends_with('/')).collect();
    let mut prefix = String::new();
    for name in names.iter().filter(|n| n.ends_with('/')) {
        let shorter = prefix.is_empty() || name.len() < prefix.len();
        if shorter && files.iter().all(|f| f.starts_with(name.as_str())) {
            prefix = name.clone();
        }
    }
    prefix
}

/// Extract `archive` under `dest`, returning extracted paths and
/// per-file SHA-256 hex digests.
fn unzip(archive: &Path, dest: &Path) -> Result<(Vec<String>, Vec<String>), SourceError> {
    let archive_err = |reason: String| SourceError::Archive {
        path: archive.to_path_buf(),
        reason,
    };
    let io_err = |path: &Path, source: std::io::Error| SourceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(archive).map_err(|e| io_err(archive, e))?;
    let mut zip = ::zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;
    std::fs::create_dir_all(dest).map_err(|e| io_err(dest, e))?;

    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    let prefix = root_prefix(&names);

    let mut filenames = Vec::new();
    let mut digests = Vec::new();

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| archive_err(e.to_string()))?;
        let name = entry.name().to_string();
        let stripped = name.strip_prefix(&prefix).unwrap_or(&name);
        if stripped.is_empty() {
            continue;
        }

        // Refuse entries that would escape the destination.
        let rel = Path::new(stripped);
        let escapes = rel.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            tracing::warn!(entry = %name, "skipping archive entry outside destination");
            continue;
        }

        let target = dest.join(rel);
        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let mut hasher = Sha256::new();
        let mut out = std::fs::File::create(&target).map_err(|e| io_err(&target, e))?;
        let mut buf = [0u8; 8192];
        loop {
            let n = entry.read(&mut buf).map_err(|e| io_err(&target, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            out.write_all(&buf[..n]).map_err(|e| io_err(&target, e))?;
        }

        digests.push(format!("{:x}", hasher.finalize()));
        filenames.push(target.display().to_string());
    }

    Ok((filenames, digests))
}

/// Combined project checksum: sort the per-file digests, serialise the
/// sorted list as a compact JSON array, and hash those bytes. Stable
/// across archive-internal ordering and timestamps.
pub(crate) fn combined_checksum(digests: &[String]) -> String {
    let mut sorted = digests.to_vec();
    sorted.sort_unstable();
    let json = serde_json::to_vec(&sorted).unwrap_or_default();
    format!("{:x}", Sha256::digest(&json))
}

/// Build a `PathBuf` for the extracted tree below an extraction root.
pub fn unzipped_root(files_path: &Path) -> PathBuf {
    files_path.join(UNZIPPED_DIR)
}

#[cfg(test)]
#[path = "zip_tests.rs"]
mod tests;
