// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Respond stage: post the final result record to the upstream API.
//!
//! Body shape: `{ title, slug, checksum, files, filesPath, info?,
//! audits: { key -> AuditResult } }`.

use crate::error::StageError;
use crate::pipeline::Stage;
use crate::record::JobRecord;
use async_trait::async_trait;
use reef_adapters::ResponseClient;
use reef_core::results::{KEY_CHECKSUM, KEY_FILES, KEY_FILES_PATH, KEY_INFO};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct Respond {
    client: Arc<dyn ResponseClient>,
}

impl Respond {
    pub fn new(client: Arc<dyn ResponseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for Respond {
    type In = JobRecord;
    type Out = JobRecord;

    fn name(&self) -> &'static str {
        "respond"
    }

    async fn process(&mut self, record: JobRecord) -> Result<JobRecord, StageError> {
        if record.cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        let mut body = serde_json::Map::new();
        body.insert("title".to_string(), json!(record.message.title));
        body.insert("slug".to_string(), json!(record.message.slug));
        for key in [KEY_CHECKSUM, KEY_FILES, KEY_FILES_PATH, KEY_INFO] {
            if let Some(value) = record.results.get(key) {
                body.insert(key.to_string(), value.clone());
            }
        }
        body.insert(
            "audits".to_string(),
            Value::Object(record.results.audit_results()),
        );
        let body = Value::Object(body);

        let endpoint = record.message.response_endpoint.clone();
        let posted = tokio::select! {
            _ = record.cancel.cancelled() => return Err(StageError::Cancelled),
            result = self.client.post(&endpoint, &body) => result,
        };
        posted.map_err(|e| StageError::ResponsePost(e.to_string()))?;

        tracing::info!(title = %record.message.title, %endpoint, "job result posted");
        Ok(record)
    }
}

#[cfg(test)]
#[path = "respond_tests.rs"]
mod tests;
