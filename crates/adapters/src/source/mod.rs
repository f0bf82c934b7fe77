// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source acquisition: turning a job's source reference into files on
//! disk plus a deterministic project checksum.

pub mod zip;

use async_trait::async_trait;
use reef_core::SourceKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use zip::ZipSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },
    #[error("archive {path} could not be read: {reason}")]
    Archive { path: PathBuf, reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Adapter responsible for getting the code to audit.
///
/// `checksum` and `files` are empty until `prepare_files` succeeds.
#[async_trait]
pub trait SourceManager: Send {
    /// Download and extract the source under `dest`.
    async fn prepare_files(&mut self, dest: &Path) -> Result<(), SourceError>;
    fn checksum(&self) -> &str;
    fn files(&self) -> &[String];
}

/// Creates a source manager for a job's source kind.
pub trait SourceFactory: Send + Sync {
    fn create(&self, kind: SourceKind, url: &str) -> Option<Box<dyn SourceManager>>;
}

/// Default factory: zip archives fetched over HTTP.
#[derive(Debug, Clone)]
pub struct DefaultSources {
    http: reqwest::Client,
}

impl DefaultSources {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl SourceFactory for DefaultSources {
    fn create(&self, kind: SourceKind, url: &str) -> Option<Box<dyn SourceManager>> {
        match kind {
            SourceKind::Zip => Some(Box::new(ZipSource::new(url, self.http.clone()))),
            SourceKind::Git => None,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::zip::{combined_checksum, UNZIPPED_DIR};
    use super::{SourceError, SourceFactory, SourceManager};
    use async_trait::async_trait;
    use reef_core::SourceKind;
    use sha2::{Digest, Sha256};
    use std::path::Path;

    /// Fake factory materialising a fixed file set for every job.
    #[derive(Debug, Clone, Default)]
    pub struct FakeSources {
        /// `(relative path, contents)` pairs written under `unzipped/`.
        pub files: Vec<(String, String)>,
    }

    impl FakeSources {
        pub fn new(files: Vec<(String, String)>) -> Self {
            Self { files }
        }
    }

    impl SourceFactory for FakeSources {
        fn create(&self, kind: SourceKind, _url: &str) -> Option<Box<dyn SourceManager>> {
            match kind {
                SourceKind::Zip => Some(Box::new(FakeSourceManager {
                    files: self.files.clone(),
                    extracted: Vec::new(),
                    checksum: String::new(),
                })),
                SourceKind::Git => None,
            }
        }
    }

    struct FakeSourceManager {
        files: Vec<(String, String)>,
        extracted: Vec<String>,
        checksum: String,
    }

    #[async_trait]
    impl SourceManager for FakeSourceManager {
        async fn prepare_files(&mut self, dest: &Path) -> Result<(), SourceError> {
            let root = dest.join(UNZIPPED_DIR);
            let mut digests = Vec::new();
            for (rel, contents) in &self.files {
                let path = root.join(rel);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|source| SourceError::Io {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                }
                tokio::fs::write(&path, contents)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.clone(),
                        source,
                    })?;
                digests.push(format!("{:x}", Sha256::digest(contents.as_bytes())));
                self.extracted.push(path.display().to_string());
            }
            if !self.extracted.is_empty() {
                self.checksum = combined_checksum(&digests);
            }
            Ok(())
        }

        fn checksum(&self) -> &str {
            &self.checksum
        }

        fn files(&self) -> &[String] {
            &self.extracted
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSources;
