// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess runner abstraction.
//!
//! The pipeline never shells out directly; it hands an executable name
//! and arguments to a [`Runner`]. Implementations must be idempotent
//! with respect to their arguments and retain no state between calls.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// Errors from tool invocations.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to run {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} timed out after {timeout:?}")]
    TimedOut { name: String, timeout: Duration },
}

/// Captured output of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

/// Adapter for invoking external tools.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, name: &str, args: &[String]) -> Result<RunOutput, RunnerError>;
}

/// Default wall-clock budget for one tool invocation.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs tools as local subprocesses with a timeout.
///
/// The child is killed if the invocation future is dropped, so a
/// cancelled job does not leave sniffer processes behind.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            timeout: TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for ShellRunner {
    async fn run(&self, name: &str, args: &[String]) -> Result<RunOutput, RunnerError> {
        tracing::debug!(name, ?args, "running tool");

        let mut cmd = tokio::process::Command::new(name);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| RunnerError::TimedOut {
                name: name.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| RunnerError::Spawn {
                name: name.to_string(),
                source,
            })?;

        Ok(RunOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{RunOutput, Runner, RunnerError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One scripted invocation outcome.
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedRun {
        pub exit_code: i32,
        pub stdout: Vec<u8>,
        pub stderr: Vec<u8>,
        /// Written to the path named by a `--report-file=` argument
        /// before returning, simulating a tool's report output.
        pub report_body: Option<String>,
    }

    impl ScriptedRun {
        pub fn clean() -> Self {
            Self::default()
        }

        pub fn with_report(body: impl Into<String>) -> Self {
            Self {
                report_body: Some(body.into()),
                ..Self::default()
            }
        }

        pub fn failing(exit_code: i32, stderr: impl Into<Vec<u8>>) -> Self {
            Self {
                exit_code,
                stderr: stderr.into(),
                ..Self::default()
            }
        }
    }

    struct FakeRunnerState {
        script: Vec<ScriptedRun>,
        calls: Vec<(String, Vec<String>)>,
    }

    /// Fake runner replaying scripted outcomes in push order.
    #[derive(Clone)]
    pub struct FakeRunner {
        inner: Arc<Mutex<FakeRunnerState>>,
    }

    impl Default for FakeRunner {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeRunnerState {
                    script: Vec::new(),
                    calls: Vec::new(),
                })),
            }
        }
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the outcome of the next invocation.
        pub fn push(&self, run: ScriptedRun) {
            self.inner.lock().script.push(run);
        }

        /// All recorded `(name, args)` invocations.
        pub fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl Runner for FakeRunner {
        async fn run(&self, name: &str, args: &[String]) -> Result<RunOutput, RunnerError> {
            let scripted = {
                let mut state = self.inner.lock();
                state.calls.push((name.to_string(), args.to_vec()));
                if state.script.is_empty() {
                    ScriptedRun::clean()
                } else {
                    state.script.remove(0)
                }
            };

            if let Some(body) = &scripted.report_body {
                if let Some(path) = args
                    .iter()
                    .find_map(|arg| arg.strip_prefix("--report-file="))
                {
                    std::fs::write(path, body).map_err(|source| RunnerError::Spawn {
                        name: name.to_string(),
                        source,
                    })?;
                }
            }

            Ok(RunOutput {
                stdout: scripted.stdout,
                stderr: scripted.stderr,
                exit_code: scripted.exit_code,
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRunner, ScriptedRun};

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
