// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream response client.
//!
//! The final pipeline stage posts one JSON result record per job to the
//! endpoint named in the job message.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("post to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },
    #[error("post to {endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
}

/// Adapter for posting job results upstream.
#[async_trait]
pub trait ResponseClient: Send + Sync {
    async fn post(&self, endpoint: &str, body: &serde_json::Value) -> Result<(), ResponseError>;
}

/// Default request timeout for the upstream post.
pub const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts results over HTTP as JSON.
#[derive(Debug, Clone)]
pub struct HttpResponseClient {
    http: reqwest::Client,
}

impl HttpResponseClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResponseClient for HttpResponseClient {
    async fn post(&self, endpoint: &str, body: &serde_json::Value) -> Result<(), ResponseError> {
        let response = self
            .http
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ResponseError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResponseError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        tracing::debug!(endpoint, "posted job result");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ResponseClient, ResponseError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One recorded post.
    #[derive(Debug, Clone)]
    pub struct PostedResponse {
        pub endpoint: String,
        pub body: serde_json::Value,
    }

    struct FakeResponseState {
        posts: Vec<PostedResponse>,
        fail_status: Option<u16>,
    }

    /// Fake response client recording posts; can replay a failure status.
    #[derive(Clone)]
    pub struct FakeResponseClient {
        inner: Arc<Mutex<FakeResponseState>>,
    }

    impl Default for FakeResponseClient {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeResponseState {
                    posts: Vec::new(),
                    fail_status: None,
                })),
            }
        }
    }

    impl FakeResponseClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent post fail with the given status.
        pub fn fail_with_status(&self, status: u16) {
            self.inner.lock().fail_status = Some(status);
        }

        pub fn posts(&self) -> Vec<PostedResponse> {
            self.inner.lock().posts.clone()
        }
    }

    #[async_trait]
    impl ResponseClient for FakeResponseClient {
        async fn post(
            &self,
            endpoint: &str,
            body: &serde_json::Value,
        ) -> Result<(), ResponseError> {
            let mut state = self.inner.lock();
            if let Some(status) = state.fail_status {
                return Err(ResponseError::Status {
                    endpoint: endpoint.to_string(),
                    status,
                });
            }
            state.posts.push(PostedResponse {
                endpoint: endpoint.to_string(),
                body: body.clone(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeResponseClient, PostedResponse};
