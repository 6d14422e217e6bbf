//! Pluggable AI backend abstraction
//!
//! This module provides a backend-agnostic interface for streaming text
//! generation. The tip pipeline only sees fragments; how they are produced
//! (Gemini over SSE, a scripted mock) stays behind the trait.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let settings = GenerationSettings::load(None)?;
//! let ai = AIClient::from_env(&settings)?;
//!
//! let mut fragments = ai.stream_generate(&GenerationRequest::new(prompt)).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, mock). Default: gemini
//! - `GEMINI_AI_KEY`: API key (required for the gemini backend)

mod gemini;
mod mock;
pub mod parsing;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use types::*;

use async_trait::async_trait;

use crate::config::{api_key_from, GenerationSettings};
use crate::error::Result;

pub const BACKEND_ENV: &str = "AI_BACKEND";

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Start a streaming completion
    ///
    /// Errors before the first fragment (connection refused, HTTP status,
    /// rejected key) are returned here; later failures arrive as `Err` items.
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (streamGenerateContent over SSE)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from the process environment
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): requires `GEMINI_AI_KEY`
    /// - `mock`: scripted responses, no network
    pub fn from_env(settings: &GenerationSettings) -> Result<Self> {
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    /// Same as [`AIClient::from_env`] with an explicit variable lookup
    pub fn from_lookup<F>(settings: &GenerationSettings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup(BACKEND_ENV).unwrap_or_else(|| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" | "" => Self::gemini_from(settings, &lookup),
            "mock" => Ok(AIClient::mock()),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                Self::gemini_from(settings, &lookup)
            }
        }
    }

    fn gemini_from<F>(settings: &GenerationSettings, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = api_key_from(lookup)?;
        Ok(AIClient::gemini(&settings.host, &settings.model, &key))
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, model: &str, api_key: &str) -> Self {
        AIClient::Gemini(GeminiBackend::new(host, model, api_key))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Backend name for logs and the health endpoint
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::Mock(_) => "mock",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        match self {
            AIClient::Gemini(b) => b.stream_generate(request).await,
            AIClient::Mock(b) => b.stream_generate(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
