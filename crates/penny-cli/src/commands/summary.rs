//! Dashboard summary command

use std::path::Path;

use anyhow::{bail, Context, Result};

use penny_core::aggregate::{budget_lines, budget_overview, summarize};
use penny_core::import::load_file;
use penny_core::models::{BudgetOverview, BudgetStatus, DashboardSummary};

use super::truncate;

/// Parse a `NAME=AMOUNT` budget argument
pub fn parse_budget(arg: &str) -> Result<(String, f64)> {
    let Some((name, amount)) = arg.rsplit_once('=') else {
        bail!("Invalid budget '{}': expected NAME=AMOUNT", arg);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid budget '{}': category name is empty", arg);
    }
    let amount: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("Invalid budget amount in '{}'", arg))?;
    if !amount.is_finite() || amount < 0.0 {
        bail!("Invalid budget '{}': amount must be zero or more", arg);
    }
    Ok((name.to_string(), amount))
}

pub fn cmd_summary(file: &Path, budgets: &[String], json: bool) -> Result<()> {
    let data = load_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let budgets = budgets
        .iter()
        .map(|b| parse_budget(b))
        .collect::<Result<Vec<_>>>()?;

    let summary = summarize(&data.transactions, &data.goals);
    let overview =
        (!budgets.is_empty()).then(|| budget_overview(&budget_lines(&summary.groups, &budgets)));

    if json {
        let mut value = serde_json::to_value(&summary)?;
        if let Some(overview) = &overview {
            value["budget"] = serde_json::to_value(overview)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_summary(&summary, data.transactions.len());
    if let Some(overview) = &overview {
        print_budget(overview);
    }
    Ok(())
}

fn print_summary(summary: &DashboardSummary, count: usize) {
    println!("📊 Dashboard Summary");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Transactions: {}", count);
    println!("   Income:       ${:>12.2}", summary.totals.total_income);
    println!("   Expenses:     ${:>12.2}", summary.totals.total_expenses);
    println!("   Net:          ${:>12.2}", summary.net);
    println!();

    if summary.groups.is_empty() {
        println!("   No expenses.");
    } else {
        println!(
            "   {:25} │ {:>10} │ {:>6} │ {:>5}",
            "Category", "Spent", "Share", "Count"
        );
        println!("   ──────────────────────────┼────────────┼────────┼───────");
        for (group, share) in summary.groups.iter().zip(&summary.breakdown) {
            let label = if group.category.is_empty() {
                "(uncategorized)".to_string()
            } else {
                truncate(&group.category, 25)
            };
            println!(
                "   {:25} │ {:>10.2} │ {:>5.1}% │ {:>5}",
                label,
                share.amount,
                share.percentage,
                group.transactions.len()
            );
        }
    }

    if !summary.goals.is_empty() {
        println!();
        println!("🎯 Goals");
        println!("   ─────────────────────────────────────────────────────────────");
        for goal in &summary.goals {
            println!(
                "   {:25} │ {:>4}% │ {:>10.2} left │ {}",
                truncate(&goal.name, 25),
                goal.percent,
                goal.remaining,
                goal.status
            );
        }
    }
}

fn print_budget(overview: &BudgetOverview) {
    println!();
    println!("💰 Budget");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:25} │ {:>10} │ {:>10} │ {:>5}",
        "Category", "Spent", "Budget", "Used"
    );
    println!("   ──────────────────────────┼────────────┼────────────┼───────");
    for line in &overview.lines {
        let marker = match line.status {
            BudgetStatus::Ok => "",
            BudgetStatus::Warning => " ⚠️",
            BudgetStatus::Over => " 🔴",
        };
        println!(
            "   {:25} │ {:>10.2} │ {:>10.2} │ {:>4}%{}",
            truncate(&line.name, 25),
            line.spent,
            line.budgeted,
            line.percent,
            marker
        );
    }
    println!("   ──────────────────────────┼────────────┼────────────┼───────");
    println!(
        "   {:25} │ {:>10.2} │ {:>10.2} │ {:>4}%",
        "Total", overview.total_spent, overview.total_budgeted, overview.percent_spent
    );
}
