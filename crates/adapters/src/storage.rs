// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage abstraction for audit artifacts.
//!
//! Keys are slash-separated paths, e.g.
//! `<checksum>/phpcs_wordpress/raw.json`. Implementations must be safe
//! for concurrent use.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("upload of {key} failed: {reason}")]
    Upload { key: String, reason: String },
    #[error("download of {key} failed: {reason}")]
    Download { key: String, reason: String },
}

/// Adapter for the artifact object store.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Filesystem-backed store: keys become paths under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key below the root. Keys must be relative and must not
    /// step upward.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(key);
        let escapes = rel.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if key.is_empty() || escapes {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Upload {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(key, bytes = bytes.len(), "stored artifact");
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{StorageError, StorageProvider};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct FakeStorageState {
        objects: HashMap<String, Vec<u8>>,
        fail_substrings: Vec<String>,
    }

    /// In-memory store recording uploads; can be primed to fail keys.
    #[derive(Clone)]
    pub struct FakeStorage {
        inner: Arc<Mutex<FakeStorageState>>,
    }

    impl Default for FakeStorage {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeStorageState {
                    objects: HashMap::new(),
                    fail_substrings: Vec::new(),
                })),
            }
        }
    }

    impl FakeStorage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail any upload whose key contains `substring`.
        pub fn fail_uploads_containing(&self, substring: impl Into<String>) {
            self.inner.lock().fail_substrings.push(substring.into());
        }

        pub fn object(&self, key: &str) -> Option<Vec<u8>> {
            self.inner.lock().objects.get(key).cloned()
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.inner.lock().objects.keys().cloned().collect();
            keys.sort_unstable();
            keys
        }
    }

    #[async_trait]
    impl StorageProvider for FakeStorage {
        async fn upload(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
            let mut state = self.inner.lock();
            if state.fail_substrings.iter().any(|s| key.contains(s.as_str())) {
                return Err(StorageError::Upload {
                    key: key.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            state.objects.insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            self.inner
                .lock()
                .objects
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::Download {
                    key: key.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStorage;

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
