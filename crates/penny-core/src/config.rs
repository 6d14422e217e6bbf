//! Tip generation settings
//!
//! Settings are resolved in three layers:
//! 1. Embedded defaults (`config/generation.toml`, compiled into the binary)
//! 2. An override file (`--config`, or `<data dir>/penny/config/generation.toml`)
//! 3. Environment variables (`GEMINI_MODEL`, `GEMINI_HOST`, `PENNY_TIP_TIMEOUT_SECS`)
//!
//! The API key is never read from a file; see [`api_key_from`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::{GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting};
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/generation.toml");

pub const API_KEY_ENV: &str = "GEMINI_AI_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const HOST_ENV: &str = "GEMINI_HOST";
pub const TIMEOUT_ENV: &str = "PENNY_TIP_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest accepted stream timeout, in seconds
pub const MAX_STREAM_TIMEOUT_SECS: u64 = 3600;

/// Effective settings for the tip pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Gemini model name
    pub model: String,
    /// Gemini API base URL
    pub host: String,
    /// Sampling parameters sent with every request
    pub generation: GenerationConfig,
    /// Threshold applied to every harm category
    pub safety_threshold: HarmBlockThreshold,
    /// Upper bound on sending plus streaming one tip
    pub stream_timeout: Duration,
    /// File the settings were read from, if not the embedded defaults
    pub source: Option<PathBuf>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            generation: GenerationConfig::default(),
            safety_threshold: HarmBlockThreshold::BlockMediumAndAbove,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            source: None,
        }
    }
}

impl GenerationSettings {
    /// Load settings from files and the process environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut settings = load_file(override_path)?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Parse a settings file; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Apply environment-style overrides from `lookup`
    ///
    /// Empty values are ignored. A timeout that is not a whole number of
    /// seconds in `1..=MAX_STREAM_TIMEOUT_SECS` is a configuration error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(model) = get(MODEL_ENV) {
            self.model = model.trim().to_string();
        }
        if let Some(host) = get(HOST_ENV) {
            self.host = host.trim().to_string();
        }
        if let Some(raw) = get(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Configuration(format!("{} must be a whole number of seconds", TIMEOUT_ENV))
            })?;
            self.stream_timeout = stream_timeout(TIMEOUT_ENV, secs)?;
        }
        Ok(())
    }

    /// One safety rule per harm category at the configured threshold
    pub fn safety_settings(&self) -> Vec<SafetySetting> {
        HarmCategory::all()
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: self.safety_threshold,
            })
            .collect()
    }
}

/// Read the Gemini API key; absent or empty is a configuration error
pub fn api_key_from<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(API_KEY_ENV)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Configuration(format!("{} is not set", API_KEY_ENV)))
}

/// Validate a timeout taken from `source`
fn stream_timeout(source: &str, secs: u64) -> Result<Duration> {
    if secs == 0 || secs > MAX_STREAM_TIMEOUT_SECS {
        return Err(Error::Configuration(format!(
            "{} must be between 1 and {} seconds, got {}",
            source, MAX_STREAM_TIMEOUT_SECS, secs
        )));
    }
    Ok(Duration::from_secs(secs))
}

/// Get the default override config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("penny").join("config").join("generation.toml"))
}

/// Load config from an explicit path, the default override location, or the embedded defaults
///
/// An explicit path must exist.
fn load_file(override_path: Option<&Path>) -> Result<GenerationSettings> {
    let path = match override_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path.to_path_buf())
        }
        None => default_config_path().filter(|p| p.exists()),
    };

    match path {
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let mut settings = parse_config(&content)?;
            settings.source = Some(path);
            Ok(settings)
        }
        None => parse_config(DEFAULT_CONFIG),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    gemini: Option<RawGemini>,
    generation: Option<RawGeneration>,
    safety: Option<RawSafety>,
    pipeline: Option<RawPipeline>,
}

#[derive(Debug, Deserialize)]
struct RawGemini {
    model: Option<String>,
    host: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeneration {
    temperature: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<u32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSafety {
    threshold: Option<HarmBlockThreshold>,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    stream_timeout_secs: Option<u64>,
}

fn parse_config(content: &str) -> Result<GenerationSettings> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Configuration(format!("Invalid config TOML: {}", e)))?;

    let mut settings = GenerationSettings::default();

    if let Some(gemini) = raw.gemini {
        if let Some(model) = gemini.model {
            settings.model = model;
        }
        if let Some(host) = gemini.host {
            settings.host = host;
        }
    }

    if let Some(generation) = raw.generation {
        let config = &mut settings.generation;
        if let Some(temperature) = generation.temperature {
            config.temperature = temperature;
        }
        if let Some(top_p) = generation.top_p {
            config.top_p = top_p;
        }
        if let Some(top_k) = generation.top_k {
            config.top_k = top_k;
        }
        if let Some(max) = generation.max_output_tokens {
            config.max_output_tokens = max;
        }
    }

    if let Some(threshold) = raw.safety.and_then(|s| s.threshold) {
        settings.safety_threshold = threshold;
    }

    if let Some(secs) = raw.pipeline.and_then(|p| p.stream_timeout_secs) {
        settings.stream_timeout = stream_timeout("stream_timeout_secs", secs)?;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_default_config() {
        let settings = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(settings, GenerationSettings::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings = GenerationSettings::from_toml(
            r#"
            [generation]
            temperature = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(settings.generation.temperature, 0.2);
        assert_eq!(settings.generation.max_output_tokens, 150);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_safety_threshold_override() {
        let settings = GenerationSettings::from_toml(
            r#"
            [safety]
            threshold = "BLOCK_ONLY_HIGH"
            "#,
        )
        .unwrap();
        let rules = settings.safety_settings();
        assert_eq!(rules.len(), 4);
        assert!(rules
            .iter()
            .all(|r| r.threshold == HarmBlockThreshold::BlockOnlyHigh));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            GenerationSettings::from_toml("[generation]\ntemperature = \"hot\""),
            Err(Error::Configuration(_))
        ));
        assert!(GenerationSettings::from_toml("[unknown]\nx = 1").is_err());
        assert!(GenerationSettings::from_toml("[pipeline]\nstream_timeout_secs = 0").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = GenerationSettings::default();
        settings
            .apply_overrides(env(&[
                (MODEL_ENV, "gemini-1.5-pro"),
                (HOST_ENV, "http://localhost:8080"),
                (TIMEOUT_ENV, "5"),
            ]))
            .unwrap();
        assert_eq!(settings.model, "gemini-1.5-pro");
        assert_eq!(settings.host, "http://localhost:8080");
        assert_eq!(settings.stream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut settings = GenerationSettings::default();
        settings
            .apply_overrides(env(&[(MODEL_ENV, "  ")]))
            .unwrap();
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_bad_timeout_env() {
        let mut settings = GenerationSettings::default();
        assert!(settings
            .apply_overrides(env(&[(TIMEOUT_ENV, "soon")]))
            .is_err());
        assert!(settings.apply_overrides(env(&[(TIMEOUT_ENV, "0")])).is_err());
    }

    #[test]
    fn test_timeout_upper_bound() {
        let mut settings = GenerationSettings::default();
        let result = settings.apply_overrides(env(&[(TIMEOUT_ENV, "18446744073709551615")]));
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert!(settings.apply_overrides(env(&[(TIMEOUT_ENV, "3601")])).is_err());
        assert_eq!(settings.stream_timeout, DEFAULT_STREAM_TIMEOUT);

        settings
            .apply_overrides(env(&[(TIMEOUT_ENV, "3600")]))
            .unwrap();
        assert_eq!(settings.stream_timeout, Duration::from_secs(3600));

        assert!(matches!(
            GenerationSettings::from_toml("[pipeline]\nstream_timeout_secs = 3601"),
            Err(Error::Configuration(_))
        ));
        let settings =
            GenerationSettings::from_toml("[pipeline]\nstream_timeout_secs = 3600").unwrap();
        assert_eq!(settings.stream_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_api_key() {
        assert_eq!(api_key_from(env(&[(API_KEY_ENV, "abc")])).unwrap(), "abc");
        assert!(matches!(
            api_key_from(env(&[])),
            Err(Error::Configuration(_))
        ));
        assert!(api_key_from(env(&[(API_KEY_ENV, "")])).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.toml");
        fs::write(&path, "[gemini]\nmodel = \"custom\"\n").unwrap();

        let settings = load_file(Some(&path)).unwrap();
        assert_eq!(settings.model, "custom");
        assert_eq!(settings.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_file(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
