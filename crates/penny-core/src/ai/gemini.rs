//! Google Gemini backend implementation
//!
//! Uses the `streamGenerateContent` endpoint with server-sent events
//! (`?alt=sse`). Every SSE event carries a partial `GenerateContentResponse`;
//! the text parts of its first candidate become one fragment.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_AI_KEY`: API key (required)
//! - `GEMINI_MODEL`: Model name (default: gemini-1.5-flash-latest)
//! - `GEMINI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::types::{FragmentStream, GenerationConfig, GenerationRequest, SafetySetting};
use super::AIBackend;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons for which the candidate carries no usable text
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Gemini backend
///
/// Cheap to clone; the HTTP client shares its connection pool.
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }
}

/// Gemini generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

impl GenerateContentRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: request.config.clone(),
            safety_settings: request.safety_settings.clone(),
        }
    }
}

/// One streamed (partial) generateContent response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or an error if the response was blocked
    fn into_text(self) -> Result<String> {
        if let Some(err) = self.error {
            return Err(Error::Upstream(format!(
                "Gemini error {}: {}",
                err.code, err.message
            )));
        }

        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::Upstream(format!("Prompt blocked: {}", reason)));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKED_FINISH_REASONS.contains(&reason) {
                return Err(Error::Upstream(format!(
                    "Candidate was blocked due to {}",
                    reason
                )));
            }
        }

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

/// Incremental server-sent events decoder
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence or a
/// line terminator; only complete lines are decoded.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk of bytes, returning the payloads of completed events
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line and any event not terminated by a blank line
    pub(crate) fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.trim_end_matches('\r');
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        if let Some(event) = self.dispatch() {
            events.push(event);
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // event:, id:, retry: and ':' comments carry nothing we use
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

/// Decode one SSE payload into a text fragment (`None` for empty text)
fn decode_event(payload: &str) -> Option<Result<String>> {
    let response: GenerateContentResponse = match serde_json::from_str(payload) {
        Ok(r) => r,
        Err(e) => {
            return Some(Err(Error::Upstream(format!(
                "Invalid stream event from Gemini: {}",
                e
            ))))
        }
    };

    match response.into_text() {
        Ok(text) if text.is_empty() => None,
        other => Some(other),
    }
}

struct SseState<S> {
    inner: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

/// Turn a byte stream of SSE events into a stream of text fragments
///
/// The stream ends after the first error.
fn sse_fragments<S, B>(inner: S) -> FragmentStream
where
    S: Stream<Item = reqwest::Result<B>> + Unpin + Send + 'static,
    B: AsRef<[u8]>,
{
    let state = SseState {
        inner,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() {
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    let events = st.decoder.push(chunk.as_ref());
                    st.pending.extend(events.iter().filter_map(|e| decode_event(e)));
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(Error::Http(e)));
                }
                None => {
                    st.finished = true;
                    let events = st.decoder.finish();
                    st.pending.extend(events.iter().filter_map(|e| decode_event(e)));
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        let body = GenerateContentRequest::from_request(request);

        debug!(model = %self.model, prompt_len = request.prompt.len(), "Sending Gemini request");

        let response = self
            .http_client
            .post(self.stream_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gemini request rejected");
            return Err(Error::Upstream(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        Ok(sse_fragments(response.bytes_stream().boxed()))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
