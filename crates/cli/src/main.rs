// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reef: audit pipeline for plugin and theme archives.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod env;
mod exit_error;
mod versions;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "reef",
    about = "Audit pipeline for plugin and theme archives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process job-message files through one pipeline run
    Run(commands::run::RunArgs),
    /// Poll a spool directory for job messages
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => commands::run::run(args).await,
        Command::Serve(args) => commands::serve::serve(args).await,
    };

    if let Err(err) = result {
        if let Some(exit) = err.downcast_ref::<ExitError>() {
            eprintln!("reef: {exit}");
            std::process::exit(exit.code);
        }
        eprintln!("reef: {err:#}");
        std::process::exit(exit_error::EXIT_CONFIG);
    }
}
