//! Mock backend for testing
//!
//! Replays a scripted sequence of fragments (or a scripted failure) instead of
//! calling a model. Useful for unit tests and development without an API key.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{Error, Result};

use super::types::{FragmentStream, GenerationRequest};
use super::AIBackend;

const MOCK_MODEL: &str = "mock";
const MOCK_HOST: &str = "mock://localhost";

/// Requests kept for inspection; older ones are dropped
pub const MAX_RECORDED_REQUESTS: usize = 16;

/// What the mock does when asked to generate
#[derive(Clone, Debug)]
enum Script {
    /// Yield these fragments, then end the stream
    Fragments(Vec<String>),
    /// Fail before any stream is produced
    SendError(String),
    /// Yield these fragments, then fail mid-stream
    StreamError(Vec<String>, String),
    /// Never yield and never end
    Stall,
}

/// Mock AI backend for testing
///
/// Returns a well-formed savings tip split across three fragments unless
/// configured otherwise. The most recent requests are kept for inspection.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    script: Script,
    requests: Arc<Mutex<VecDeque<GenerationRequest>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self::with_fragments(&[
            "{\"tip\": \"Move a fixed amount into savings",
            " the day you get paid.\", \"category\": ",
            "\"Savings\"}",
        ])
    }

    /// Stream exactly these fragments
    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self::scripted(Script::Fragments(
            fragments.iter().map(|f| f.to_string()).collect(),
        ))
    }

    /// Fail the upstream call with this message
    pub fn failing(message: &str) -> Self {
        Self::scripted(Script::SendError(message.to_string()))
    }

    /// Stream some fragments, then fail with this message
    pub fn failing_mid_stream(fragments: &[&str], message: &str) -> Self {
        Self::scripted(Script::StreamError(
            fragments.iter().map(|f| f.to_string()).collect(),
            message.to_string(),
        ))
    }

    /// Open a stream that never produces anything
    pub fn stalled() -> Self {
        Self::scripted(Script::Stall)
    }

    fn scripted(script: Script) -> Self {
        Self {
            healthy: true,
            script,
            requests: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_RECORDED_REQUESTS))),
        }
    }

    /// Up to [`MAX_RECORDED_REQUESTS`] most recent requests, oldest first
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        if let Ok(mut log) = self.requests.lock() {
            if log.len() == MAX_RECORDED_REQUESTS {
                log.pop_front();
            }
            log.push_back(request.clone());
        }

        match &self.script {
            Script::Fragments(fragments) => {
                Ok(futures::stream::iter(fragments.clone().into_iter().map(Ok)).boxed())
            }
            Script::SendError(message) => Err(Error::Upstream(message.clone())),
            Script::StreamError(fragments, message) => {
                let items: Vec<Result<String>> = fragments
                    .iter()
                    .cloned()
                    .map(Ok)
                    .chain(std::iter::once(Err(Error::Upstream(message.clone()))))
                    .collect();
                Ok(futures::stream::iter(items).boxed())
            }
            Script::Stall => Ok(futures::stream::pending::<Result<String>>().boxed()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        MOCK_MODEL
    }

    fn host(&self) -> &str {
        MOCK_HOST
    }
}
