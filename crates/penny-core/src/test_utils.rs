//! Test utilities for penny-core
//!
//! This module provides a mock Gemini server that speaks the
//! `streamGenerateContent?alt=sse` protocol, for development and integration
//! tests of the real HTTP backend.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::oneshot;

/// API key the mock server accepts
pub const MOCK_API_KEY: &str = "test-key";

/// How the mock answers generate requests
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Stream one SSE event per text fragment, each event in its own body chunk
    Fragments(Vec<String>),
    /// Stream these raw SSE payloads verbatim (for blocked or broken events)
    RawEvents(Vec<String>),
    /// Reply with a non-2xx status and JSON error body
    Status(u16, String),
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

/// Mock Gemini server for testing and development
pub struct MockGeminiServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server with a well-formed tip reply
    pub async fn start() -> Self {
        Self::start_with(MockReply::Fragments(vec![
            "{\"tip\": \"Round up every purchase".to_string(),
            " into savings.\", \"category\": \"Savings\"}".to_string(),
        ]))
        .await
    }

    /// Start the mock server on an available port with a custom reply
    pub async fn start_with(reply: MockReply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route(
                "/v1beta/models/:model",
                get(handle_model).post(handle_generate),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// JSON bodies of generate requests received so far
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|k| k == MOCK_API_KEY)
}

fn error_response(code: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "error": {"code": code, "message": message, "status": "MOCK_ERROR"}
    });
    (status, Json(body)).into_response()
}

/// Model metadata endpoint (health check)
async fn handle_model(Path(model): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error_response(403, "API key not valid");
    }
    Json(serde_json::json!({
        "name": format!("models/{}", model),
        "displayName": "Mock Gemini",
    }))
    .into_response()
}

/// Streaming generate endpoint: `POST /v1beta/models/{model}:streamGenerateContent`
async fn handle_generate(
    State(state): State<MockState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !model_action.ends_with(":streamGenerateContent") {
        return error_response(404, "Unknown action");
    }
    if !authorized(&headers) {
        return error_response(403, "API key not valid");
    }

    state.requests.lock().unwrap().push(body);

    let payloads: Vec<String> = match state.reply {
        MockReply::Fragments(fragments) => fragments.iter().map(|f| text_event(f)).collect(),
        MockReply::RawEvents(events) => events,
        MockReply::Status(code, message) => return error_response(code, &message),
    };

    let chunks: Vec<Result<String, Infallible>> = payloads
        .into_iter()
        .map(|p| Ok(format!("data: {}\r\n\r\n", p)))
        .collect();

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
        .into_response()
}

/// One GenerateContentResponse event carrying `text`
pub fn text_event(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "index": 0
        }]
    })
    .to_string()
}
