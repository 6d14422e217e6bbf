//! AI tip pipeline
//!
//! One request moves through a fixed sequence of stages:
//!
//! ```text
//! Idle -> Sending -> Streaming -> Parsing -> Success
//!            \           \           \
//!             `-----------`-----------`----> Failed
//! ```
//!
//! Sending renders the prompt and opens the upstream stream. Streaming
//! concatenates fragments in arrival order. Parsing strips code fences and
//! validates the `{tip, category}` object. Sending plus streaming share one
//! deadline so a stalled upstream cannot hold a request open forever.
//!
//! The pipeline holds only immutable configuration and a cloneable client,
//! so concurrent requests share nothing mutable.

use std::fmt;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, trace, warn};

use crate::ai::parsing::parse_tip_response;
use crate::ai::{
    AIBackend, AIClient, FragmentStream, GenerationConfig, GenerationRequest, SafetySetting,
};
use crate::config::GenerationSettings;
use crate::error::{Error, Result};
use crate::models::{TipRequest, TipResult};
use crate::prompts::tip_prompt;

/// Stage of a single tip request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipStage {
    Idle,
    Sending,
    Streaming,
    Parsing,
    Success,
    Failed,
}

impl TipStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sending => "sending",
            Self::Streaming => "streaming",
            Self::Parsing => "parsing",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Success and Failed are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for TipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs stage transitions for one request
struct StageTracker {
    stage: TipStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: TipStage::Idle,
        }
    }

    fn advance(&mut self, next: TipStage) {
        debug!(from = %self.stage, to = %next, "Tip pipeline transition");
        self.stage = next;
    }
}

/// Tip pipeline: prompt, stream, aggregate, parse
#[derive(Clone)]
pub struct TipPipeline {
    ai: AIClient,
    generation: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
    stream_timeout: Duration,
}

impl TipPipeline {
    /// Build a pipeline from a client and resolved settings
    pub fn new(ai: AIClient, settings: &GenerationSettings) -> Self {
        Self {
            ai,
            generation: settings.generation.clone(),
            safety_settings: settings.safety_settings(),
            stream_timeout: settings.stream_timeout,
        }
    }

    /// Override the sending plus streaming deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// The AI client used for generation
    pub fn client(&self) -> &AIClient {
        &self.ai
    }

    pub fn stream_timeout(&self) -> Duration {
        self.stream_timeout
    }

    /// Upstream request for a tip
    pub fn generation_request(&self, request: &TipRequest) -> GenerationRequest {
        GenerationRequest {
            prompt: tip_prompt(request),
            config: self.generation.clone(),
            safety_settings: self.safety_settings.clone(),
        }
    }

    /// Produce one tip for the request
    ///
    /// Returns `Upstream` for transport, provider, or timeout failures and
    /// `MalformedAIResponse` when the aggregated text is not a valid tip.
    /// A timeout too large to form a deadline is a `Configuration` error.
    pub async fn get_tip(&self, request: &TipRequest) -> Result<TipResult> {
        let mut tracker = StageTracker::new();

        match self.run(request, &mut tracker).await {
            Ok(tip) => {
                tracker.advance(TipStage::Success);
                info!(category = %tip.category, "Generated AI tip");
                Ok(tip)
            }
            Err(e) => {
                let failed_in = tracker.stage;
                tracker.advance(TipStage::Failed);
                warn!(stage = %failed_in, error = %e, "AI tip request failed");
                Err(e)
            }
        }
    }

    async fn run(&self, request: &TipRequest, tracker: &mut StageTracker) -> Result<TipResult> {
        let deadline = Instant::now()
            .checked_add(self.stream_timeout)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "stream timeout of {}s is out of range",
                    self.stream_timeout.as_secs()
                ))
            })?;

        tracker.advance(TipStage::Sending);
        let generation = self.generation_request(request);
        trace!(prompt = %generation.prompt, "Rendered tip prompt");

        let stream = timeout_at(deadline, self.ai.stream_generate(&generation))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(into_upstream)?;

        tracker.advance(TipStage::Streaming);
        let text = timeout_at(deadline, collect_fragments(stream))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(into_upstream)?;

        tracker.advance(TipStage::Parsing);
        parse_tip_response(&text)
    }

    fn timeout_error(&self) -> Error {
        Error::Upstream(format!(
            "no complete response within {}s",
            self.stream_timeout.as_secs_f64()
        ))
    }
}

/// Concatenate every fragment in arrival order
///
/// Stops at the first failed fragment; the partial text is discarded.
pub async fn collect_fragments(mut stream: FragmentStream) -> Result<String> {
    let mut text = String::new();
    let mut count = 0usize;

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        trace!(fragment = %fragment, "Received fragment");
        text.push_str(&fragment);
        count += 1;
    }

    debug!(fragments = count, chars = text.len(), "Stream complete");
    Ok(text)
}

/// Transport errors from the HTTP client surface as upstream failures
fn into_upstream(err: Error) -> Error {
    match err {
        Error::Http(e) => Error::Upstream(e.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::{Goal, Transaction};

    fn pipeline(backend: MockBackend) -> TipPipeline {
        TipPipeline::new(AIClient::Mock(backend), &GenerationSettings::default())
    }

    fn request() -> TipRequest {
        TipRequest {
            goals: vec![Goal::new("g1", "Emergency Fund", 5000.0, 1000.0)],
            transactions: vec![Transaction::new(
                "t1",
                -42.8,
                "Dining",
                "2024-05-03T19:30:00Z",
                "Dinner out",
            )],
            balance: 1234.5,
        }
    }

    #[tokio::test]
    async fn test_fragments_split_mid_token() {
        let backend = MockBackend::with_fragments(&[
            "{\"ti",
            "p\":\"Save more\",\"categ",
            "ory\":\"Savings\"}",
        ]);
        let tip = pipeline(backend).get_tip(&request()).await.unwrap();
        assert_eq!(tip.tip, "Save more");
        assert_eq!(tip.category, "Savings");
    }

    #[tokio::test]
    async fn test_fenced_response() {
        let backend = MockBackend::with_fragments(&[
            "```json\n{\"tip\":\"Cook at home\",",
            "\"category\":\"Spending\"}\n```",
        ]);
        let tip = pipeline(backend).get_tip(&request()).await.unwrap();
        assert_eq!(tip.category, "Spending");
    }

    #[tokio::test]
    async fn test_sends_prompt_and_settings() {
        let backend = MockBackend::new();
        pipeline(backend.clone()).get_tip(&request()).await.unwrap();

        let sent = backend.recorded_requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].prompt.contains("User Balance: $1234.50"));
        assert!(sent[0].prompt.contains("- Emergency Fund ($1000 / $5000)"));
        assert!(sent[0].prompt.contains("- 2024-05-03: Dinner out: $-42.80 (Dining)"));
        assert_eq!(sent[0].config.max_output_tokens, 150);
        assert_eq!(sent[0].safety_settings.len(), 4);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let err = pipeline(MockBackend::failing("network unreachable"))
            .get_tip(&request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Gemini API call failed: network unreachable");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_partial_text() {
        let err = pipeline(MockBackend::failing_mid_stream(&["{\"tip\":"], "connection reset"))
            .get_tip(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let err = pipeline(MockBackend::with_fragments(&["Here is a tip: ", "spend less."]))
            .get_tip(&request())
            .await
            .unwrap_err();
        match err {
            Error::MalformedAIResponse { raw } => assert_eq!(raw, "Here is a tip: spend less."),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_stream_is_malformed() {
        let err = pipeline(MockBackend::with_fragments(&[]))
            .get_tip(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedAIResponse { ref raw } if raw.is_empty()));
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let err = pipeline(MockBackend::stalled())
            .with_timeout(Duration::from_millis(50))
            .get_tip(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(ref m) if m.contains("no complete response")));
    }

    #[tokio::test]
    async fn test_out_of_range_timeout_is_an_error() {
        let backend = MockBackend::new();
        let err = pipeline(backend.clone())
            .with_timeout(Duration::MAX)
            .get_tip(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(backend.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_collect_fragments_preserves_order() {
        let stream = futures::stream::iter(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
            Ok("c".to_string()),
        ])
        .boxed();
        assert_eq!(collect_fragments(stream).await.unwrap(), "abc");
    }

    #[test]
    fn test_stage_terminal() {
        assert!(TipStage::Success.is_terminal());
        assert!(TipStage::Failed.is_terminal());
        assert!(!TipStage::Streaming.is_terminal());
        assert_eq!(TipStage::Parsing.to_string(), "parsing");
    }

    #[test]
    fn test_into_upstream_keeps_other_errors() {
        let err = into_upstream(Error::malformed("x"));
        assert!(matches!(err, Error::MalformedAIResponse { .. }));
    }
}
