// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reef-adapters: the pipeline's seams to the outside world.
//!
//! Each adapter is a small async trait with one production
//! implementation and, behind the `test-support` feature, a fake that
//! records calls and replays scripted outcomes.

pub mod respond;
pub mod runner;
pub mod source;
pub mod storage;

pub use respond::{HttpResponseClient, ResponseClient, ResponseError};
pub use runner::{RunOutput, Runner, RunnerError, ShellRunner};
pub use source::{DefaultSources, SourceError, SourceFactory, SourceManager};
pub use storage::{LocalStorage, StorageError, StorageProvider};

#[cfg(any(test, feature = "test-support"))]
pub use respond::FakeResponseClient;
#[cfg(any(test, feature = "test-support"))]
pub use runner::{FakeRunner, ScriptedRun};
#[cfg(any(test, feature = "test-support"))]
pub use source::FakeSources;
#[cfg(any(test, feature = "test-support"))]
pub use storage::FakeStorage;
