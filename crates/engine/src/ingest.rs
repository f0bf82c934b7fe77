// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest stage: validate the message, fetch and extract the source,
//! and compute the project checksum.

use crate::error::{ConfigError, StageError};
use crate::pipeline::Stage;
use crate::record::{InFlight, JobRecord};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use reef_adapters::SourceFactory;
use reef_core::results::{KEY_CHECKSUM, KEY_FILES, KEY_FILES_PATH};
use reef_core::JobMessage;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Ingest {
    temp_root: PathBuf,
    sources: Arc<dyn SourceFactory>,
    cancel: CancellationToken,
    in_flight: InFlight,
}

impl std::fmt::Debug for Ingest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingest")
            .field("temp_root", &self.temp_root)
            .field("cancel", &self.cancel)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl Ingest {
    /// Validate dependencies and build the stage.
    pub fn configure(
        temp_root: PathBuf,
        sources: Arc<dyn SourceFactory>,
        cancel: CancellationToken,
        in_flight: InFlight,
    ) -> Result<Self, ConfigError> {
        if temp_root.as_os_str().is_empty() {
            return Err(ConfigError::NoTempFolder);
        }
        std::fs::create_dir_all(&temp_root).map_err(|e| ConfigError::BadTempFolder {
            path: temp_root.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            temp_root,
            sources,
            cancel,
            in_flight,
        })
    }

    /// Extraction directory for a source url: stable per url, opaque on
    /// disk.
    fn extraction_dir(&self, source_url: &str) -> PathBuf {
        let digest = Sha256::digest(source_url.as_bytes());
        self.temp_root
            .join(format!("audit-{}", URL_SAFE.encode(digest)))
    }
}

#[async_trait]
impl Stage for Ingest {
    type In = JobMessage;
    type Out = JobRecord;

    fn name(&self) -> &'static str {
        "ingest"
    }

    async fn process(&mut self, msg: JobMessage) -> Result<JobRecord, StageError> {
        msg.validate()?;
        tracing::info!(title = %msg.title, source = %msg.source_url, "ingesting");

        let mut source = self
            .sources
            .create(msg.source_type, &msg.source_url)
            .ok_or_else(|| StageError::NoSourceManager(msg.source_type.to_string()))?;

        let files_path = self.extraction_dir(&msg.source_url);
        let mut record = JobRecord::new(msg, self.cancel.child_token(), &self.in_flight);
        record.arm_cleanup(files_path.clone());

        let prepared = tokio::select! {
            _ = record.cancel.cancelled() => return Err(StageError::Cancelled),
            result = source.prepare_files(&files_path) => result,
        };
        prepared.map_err(|e| StageError::SourceAcquisition(e.to_string()))?;

        let checksum = source.checksum().to_string();
        if checksum.is_empty() {
            return Err(StageError::EmptyChecksum);
        }

        record.results.insert(KEY_CHECKSUM, json!(checksum))?;
        record.results.insert(KEY_FILES, json!(source.files()))?;
        record
            .results
            .insert(KEY_FILES_PATH, json!(files_path.display().to_string()))?;
        record.files_path = Some(files_path);

        tracing::info!(title = %record.message.title, %checksum, "project checksum computed");
        Ok(record)
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
