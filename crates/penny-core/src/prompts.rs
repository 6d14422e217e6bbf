//! Prompt rendering for the financial tip request
//!
//! The prompt is a deterministic text template over the caller's balance,
//! goals, and recent transactions. Input order is preserved; only the first
//! few goals and transactions are listed, followed by a count of the rest.

use std::fmt;

use crate::models::{Goal, TipRequest, Transaction};

/// Goals listed individually before the "...and N more." line
pub const MAX_GOALS_IN_PROMPT: usize = 3;

/// Transactions listed individually before the "...and N more." line
pub const MAX_TRANSACTIONS_IN_PROMPT: usize = 5;

const INTRO: &str = "Analyze the following user financial data and provide ONE short, actionable financial tip (1-2 sentences) and a relevant category (e.g., Savings, Budgeting, Spending, Investment). Focus on being helpful and concise.";

/// Output format instruction appended to every tip prompt
pub const RESPONSE_FORMAT_INSTRUCTION: &str = "Respond ONLY with a JSON object containing 'tip' and 'category' keys, like this: { \"tip\": \"...\", \"category\": \"...\" }. Do not include markdown formatting (like ```json).";

/// Financial summary section of the tip prompt
struct Summary<'a> {
    balance: f64,
    goals: &'a [Goal],
    transactions: &'a [Transaction],
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", INTRO)?;
        writeln!(f)?;
        writeln!(f, "User Balance: ${:.2}", self.balance)?;
        writeln!(f)?;

        writeln!(f, "Goals ({}):", self.goals.len())?;
        for goal in self.goals.iter().take(MAX_GOALS_IN_PROMPT) {
            writeln!(
                f,
                "- {} (${} / ${})",
                goal.name, goal.current_amount, goal.target_amount
            )?;
        }
        write_remainder(f, self.goals.len(), MAX_GOALS_IN_PROMPT)?;

        writeln!(f)?;
        writeln!(f, "Recent Transactions ({}):", self.transactions.len())?;
        for tx in self.transactions.iter().take(MAX_TRANSACTIONS_IN_PROMPT) {
            writeln!(
                f,
                "- {}: {}: ${:.2} ({})",
                tx.date_prefix(),
                tx.description,
                tx.amount,
                tx.category
            )?;
        }
        write_remainder(f, self.transactions.len(), MAX_TRANSACTIONS_IN_PROMPT)
    }
}

fn write_remainder(f: &mut fmt::Formatter<'_>, total: usize, shown: usize) -> fmt::Result {
    if total > shown {
        writeln!(f, "- ...and {} more.", total - shown)?;
    }
    Ok(())
}

/// Render the financial summary part of the prompt
pub fn build_prompt(balance: f64, goals: &[Goal], transactions: &[Transaction]) -> String {
    Summary {
        balance,
        goals,
        transactions,
    }
    .to_string()
}

/// Full prompt sent upstream: the financial summary plus the JSON-only instruction
pub fn tip_prompt(request: &TipRequest) -> String {
    format!(
        "{}\n\n{}",
        build_prompt(request.balance, &request.goals, &request.transactions),
        RESPONSE_FORMAT_INSTRUCTION
    )
}
