//! Penny CLI - Budgeting dashboard backend
//!
//! Usage:
//!   penny serve --port 3001           Start web server
//!   penny summary --file tx.csv       Print dashboard totals and categories
//!   penny prompt --file request.json  Show the rendered tip prompt
//!   penny tip --file request.json     Generate one AI tip
//!   penny config                      Show generation settings

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve {
            port,
            host,
            allowed_origins,
            static_dir,
        } => {
            commands::cmd_serve(config, &host, port, allowed_origins, static_dir.as_deref()).await
        }
        Commands::Summary {
            file,
            budgets,
            json,
        } => commands::cmd_summary(&file, &budgets, json),
        Commands::Prompt { file } => commands::cmd_prompt(&file),
        Commands::Tip { file, settings } => {
            commands::cmd_tip(config, &file, settings.as_deref()).await
        }
        Commands::Config => commands::cmd_config(config),
    }
}
