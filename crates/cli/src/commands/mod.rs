// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `reef` subcommands.

pub mod run;
pub mod serve;

use crate::env;
use crate::exit_error::ExitError;
use crate::versions;
use anyhow::{Context, Result};
use reef_adapters::{DefaultSources, HttpResponseClient, LocalStorage, ShellRunner};
use reef_engine::{Pipeline, PipelineConfig, PipelineDeps};
use std::path::PathBuf;
use std::sync::Arc;

/// Flags shared by every pipeline-running subcommand.
#[derive(clap::Args, Debug)]
pub struct PipelineArgs {
    /// Temp root for extraction and transient report files
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,
    /// Artifact store root
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
    /// Versions table file (JSON: standard -> tool -> version)
    #[arg(long)]
    pub versions: Option<PathBuf>,
}

/// Resolve config and wire a pipeline with the production adapters.
pub(crate) fn build_pipeline(args: &PipelineArgs) -> Result<Pipeline> {
    let http = reqwest::Client::builder()
        .timeout(env::http_timeout())
        .build()
        .context("failed to build http client")?;

    let storage_dir = args
        .storage_dir
        .clone()
        .or_else(env::storage_dir)
        .ok_or_else(|| ExitError::config("no storage directory; set --storage-dir or HOME"))?;
    let versions_path = args.versions.clone().or_else(env::versions_file);
    let versions = versions::load(versions_path.as_deref())
        .map_err(|e| ExitError::config(format!("{e:#}")))?;

    let config = PipelineConfig {
        temp_root: args.temp_dir.clone().unwrap_or_else(env::temp_dir),
        versions,
        channel_capacity: env::channel_capacity(),
    };
    let deps = PipelineDeps {
        sources: Arc::new(DefaultSources::new(http.clone())),
        storage: Arc::new(LocalStorage::new(storage_dir)),
        runner: Arc::new(ShellRunner::new()),
        response: Arc::new(HttpResponseClient::from_client(http)),
    };

    Pipeline::configure(config, deps)
        .map_err(|e| ExitError::config(e.to_string()).into())
}
