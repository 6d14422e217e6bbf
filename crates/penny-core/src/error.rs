//! Error types for Penny

use thiserror::Error;

/// Number of raw response characters kept for diagnostics
pub const RAW_PREVIEW_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed inbound request (mapped to 400 at the HTTP boundary)
    #[error("Invalid request payload: {0}")]
    Validation(String),

    /// Network or service failure talking to the AI provider
    #[error("Gemini API call failed: {0}")]
    Upstream(String),

    /// The AI provider replied, but the content did not have the required shape
    #[error("Failed to parse response from Gemini AI. Raw: {raw}")]
    MalformedAIResponse { raw: String },

    /// Missing or invalid process configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Build a `MalformedAIResponse` keeping only the first 100 characters of the buffer
    pub fn malformed(raw: &str) -> Self {
        Error::MalformedAIResponse {
            raw: raw.chars().take(RAW_PREVIEW_CHARS).collect(),
        }
    }

    /// Whether this error came from a bad inbound request rather than the pipeline
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
