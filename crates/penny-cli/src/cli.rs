//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Penny - Budgeting dashboard with AI financial tips
#[derive(Parser)]
#[command(name = "penny")]
#[command(about = "Budgeting dashboard backend with AI-generated financial tips", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Generation settings file (overrides the default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable, e.g. http://localhost:5173)
        #[arg(long = "allowed-origin")]
        allowed_origins: Vec<String>,

        /// Directory containing the dashboard bundle to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print totals, category groups, and goal progress for a data file
    Summary {
        /// Transactions file (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Monthly budget for a category, as NAME=AMOUNT (repeatable)
        #[arg(short, long = "budget")]
        budgets: Vec<String>,

        /// Print the summary as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Print the tip prompt that would be sent for a data file
    Prompt {
        /// Request file (.json with transactions, goals, balance; or .csv)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Generate one AI financial tip for a data file
    Tip {
        /// Request file (.json with transactions, goals, balance; or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// User settings file (.json); tips are skipped when dailyTips is off
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },

    /// Show the effective generation configuration
    Config,
}
