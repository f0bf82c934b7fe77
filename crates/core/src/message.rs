// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job message schema and validation.
//!
//! A job message is the inbound unit of work: it names a source archive,
//! the audits to run against it, and where to post the results. Messages
//! are immutable after validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation failures for an inbound job message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message does not have a title")]
    MissingTitle,
    #[error("{0}: does not provide a slug")]
    MissingSlug(String),
    #[error("{0}: does not provide an endpoint")]
    MissingEndpoint(String),
    #[error("{0}: source url is empty")]
    MissingSourceUrl(String),
    #[error("{0}: no audits requested")]
    NoAudits(String),
}

/// Kind of source archive referenced by a job message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Zip,
    Git,
}

crate::simple_display! {
    SourceKind {
        Zip => "zip",
        Git => "git",
    }
}

/// Kind of audit requested for a job.
///
/// Only `phpcs` audits are executed by the analyse stage; other kinds
/// pass through untouched so the message schema stays open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Phpcs,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditKind::Phpcs => f.write_str("phpcs"),
            AuditKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// Options attached to one audit request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    /// Sniffer standard to run, e.g. `wordpress` or `phpcompatibility`.
    #[serde(default)]
    pub standard: String,
    /// Raw `--runtime-set` value, e.g. `testVersion 5.2-`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_set: Option<String>,
    /// Overrides the standard passed to the sniffer verbatim (the
    /// versions table is still resolved by `standard`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_override: Option<String>,
}

/// One requested audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    #[serde(rename = "type")]
    pub kind: AuditKind,
    #[serde(default)]
    pub options: AuditOptions,
}

/// Inbound unit of work, as produced by the upstream queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub title: String,
    pub slug: String,
    pub source_url: String,
    pub source_type: SourceKind,
    pub response_endpoint: String,
    #[serde(default)]
    pub audits: Vec<AuditRequest>,
}

impl JobMessage {
    /// Ensure the message carries the minimum required fields.
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.title.is_empty() {
            return Err(MessageError::MissingTitle);
        }
        if self.slug.is_empty() {
            return Err(MessageError::MissingSlug(self.title.clone()));
        }
        if self.response_endpoint.is_empty() {
            return Err(MessageError::MissingEndpoint(self.title.clone()));
        }
        if self.source_url.is_empty() {
            return Err(MessageError::MissingSourceUrl(self.title.clone()));
        }
        if self.audits.is_empty() {
            return Err(MessageError::NoAudits(self.title.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
