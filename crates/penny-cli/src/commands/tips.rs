//! Tip commands: prompt preview and one-off generation

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use penny_core::ai::AIBackend;
use penny_core::import::load_file;
use penny_core::models::UserSettings;
use penny_core::prompts::tip_prompt;
use penny_core::{AIClient, GenerationSettings, TipPipeline};

/// Read a user settings file
pub fn load_user_settings(path: &Path) -> Result<UserSettings> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&content)
        .with_context(|| format!("Invalid user settings in {}", path.display()))
}

pub fn cmd_prompt(file: &Path) -> Result<()> {
    let data = load_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    println!("{}", tip_prompt(&data.to_tip_request()));
    Ok(())
}

pub async fn cmd_tip(
    config_path: Option<&Path>,
    file: &Path,
    settings_path: Option<&Path>,
) -> Result<()> {
    if let Some(path) = settings_path {
        let user = load_user_settings(path)?;
        if !user.notifications.daily_tips {
            println!("ℹ️  Daily tips are turned off in {}", path.display());
            return Ok(());
        }
    }

    let data = load_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let settings =
        GenerationSettings::load(config_path).context("Failed to load generation settings")?;
    let ai = AIClient::from_env(&settings).context("AI backend is not configured")?;

    run_tip(TipPipeline::new(ai, &settings), &data.to_tip_request()).await
}

/// Run one tip request and print the result
pub async fn run_tip(tips: TipPipeline, request: &penny_core::TipRequest) -> Result<()> {
    println!(
        "💡 Asking {} for a tip ({} goals, {} transactions)...",
        tips.client().model(),
        request.goals.len(),
        request.transactions.len()
    );

    let tip = tips
        .get_tip(request)
        .await
        .context("Failed to get AI tip")?;

    println!();
    println!("   [{}] {}", tip.category, tip.tip);
    Ok(())
}
