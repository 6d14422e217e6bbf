//! AI backend request types
//!
//! These types are backend-agnostic and used across all AI implementations.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A finite stream of text fragments, in arrival order
///
/// The stream ends when the upstream signals completion. An `Err` item ends
/// the stream early.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Sampling parameters for text generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 150,
        }
    }
}

/// Content-harm category screened by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub fn all() -> &'static [HarmCategory] {
        &[
            Self::Harassment,
            Self::HateSpeech,
            Self::SexuallyExplicit,
            Self::DangerousContent,
        ]
    }
}

/// Blocking threshold for a harm category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

/// One content-safety rule sent with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// One safety rule per harm category, all at `threshold`
pub fn safety_settings_at(threshold: HarmBlockThreshold) -> Vec<SafetySetting> {
    HarmCategory::all()
        .iter()
        .map(|&category| SafetySetting {
            category,
            threshold,
        })
        .collect()
}

/// A single text-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerationRequest {
    /// Request with the default generation config and safety settings
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            config: GenerationConfig::default(),
            safety_settings: safety_settings_at(HarmBlockThreshold::BlockMediumAndAbove),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_serialization() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(json["topP"], 1.0);
        assert_eq!(json["topK"], 1);
        assert_eq!(json["maxOutputTokens"], 150);
    }

    #[test]
    fn test_safety_settings_serialization() {
        let rules = safety_settings_at(HarmBlockThreshold::BlockMediumAndAbove);
        let json = serde_json::to_value(rules).unwrap();
        let settings = json.as_array().unwrap();
        assert_eq!(settings.len(), 4);
        assert_eq!(settings[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(settings[1]["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(settings[2]["category"], "HARM_CATEGORY_SEXUALLY_EXPLICIT");
        assert_eq!(settings[3]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
        assert!(settings
            .iter()
            .all(|s| s["threshold"] == "BLOCK_MEDIUM_AND_ABOVE"));
    }
}
