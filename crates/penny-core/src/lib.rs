//! Penny Core Library
//!
//! Shared functionality for the Penny budgeting dashboard:
//! - Transaction and goal models
//! - Dashboard aggregation (totals, category groups, goal and budget progress)
//! - Prompt rendering for AI financial tips
//! - Pluggable AI backends (Gemini over SSE, mock)
//! - Tip pipeline: stream, aggregate, and validate model output
//! - Generation settings and transaction file import

pub mod aggregate;
pub mod ai;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod prompts;
pub mod tips;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, FragmentStream, GeminiBackend, GenerationConfig, GenerationRequest,
    HarmBlockThreshold, HarmCategory, MockBackend, SafetySetting,
};
pub use config::GenerationSettings;
pub use error::{Error, Result};
pub use import::{DashboardData, FileFormat};
pub use models::*;
pub use tips::{TipPipeline, TipStage};
