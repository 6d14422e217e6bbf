//! Generation settings command

use std::path::Path;

use anyhow::{Context, Result};

use penny_core::ai::BACKEND_ENV;
use penny_core::config::{default_config_path, API_KEY_ENV};
use penny_core::GenerationSettings;

pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let settings =
        GenerationSettings::load(config_path).context("Failed to load generation settings")?;

    println!("⚙️  Generation settings");
    println!();
    match &settings.source {
        Some(path) => println!("   Source:      {}", path.display()),
        None => println!("   Source:      built-in defaults"),
    }
    if let Some(path) = default_config_path() {
        println!("   Override at: {}", path.display());
    }
    println!();
    println!("   Model:       {}", settings.model);
    println!("   Host:        {}", settings.host);
    println!("   Timeout:     {}s", settings.stream_timeout.as_secs());
    println!();
    println!("   temperature:       {}", settings.generation.temperature);
    println!("   top_p:             {}", settings.generation.top_p);
    println!("   top_k:             {}", settings.generation.top_k);
    println!("   max_output_tokens: {}", settings.generation.max_output_tokens);
    println!();
    println!("   Safety threshold: {:?}", settings.safety_threshold);
    println!();

    let backend = std::env::var(BACKEND_ENV).unwrap_or_else(|_| "gemini".to_string());
    println!("   {}: {}", BACKEND_ENV, backend);
    if std::env::var(API_KEY_ENV).map(|k| !k.trim().is_empty()).unwrap_or(false) {
        println!("   {}: set", API_KEY_ENV);
    } else {
        println!("   ⚠️  {} not set (required unless {}=mock)", API_KEY_ENV, BACKEND_ENV);
    }

    Ok(())
}
