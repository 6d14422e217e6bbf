//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use penny_core::ai::AIBackend;
use penny_core::{AIClient, GenerationSettings, TipPipeline};

pub async fn cmd_serve(
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
    static_dir: Option<&Path>,
) -> Result<()> {
    // Configuration problems are fatal before the listener binds
    let settings =
        GenerationSettings::load(config_path).context("Failed to load generation settings")?;
    let ai = AIClient::from_env(&settings).context("AI backend is not configured")?;
    let tips = TipPipeline::new(ai, &settings);

    println!("🚀 Starting Penny web server...");
    println!("   Listening: http://{}:{}", host, port);
    println!(
        "   AI backend: {} ({} @ {})",
        tips.client().backend_name(),
        tips.client().model(),
        tips.client().host()
    );
    println!("   Tip timeout: {}s", tips.stream_timeout().as_secs());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!("   CORS: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = penny_server::ServerConfig { allowed_origins };
    let static_dir = static_dir.map(|p| p.to_string_lossy().into_owned());

    penny_server::serve(tips, host, port, static_dir.as_deref(), config).await
}
