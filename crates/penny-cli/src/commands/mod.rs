//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Show effective generation settings
//! - `serve` - Web server command
//! - `summary` - Dashboard totals, categories, goals, and budgets
//! - `tips` - Prompt preview and one-off tip generation

pub mod config;
pub mod serve;
pub mod summary;
pub mod tips;

// Re-export command functions for main.rs
pub use config::*;
pub use serve::*;
pub use summary::*;
pub use tips::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
