//! Transaction aggregation for the dashboard
//!
//! Pure, single-pass functions over a flat list of transactions. Nothing here
//! touches the network or mutates its input.
//!
//! Category labels are grouping keys used verbatim: "Food" and "food" are two
//! different groups.

use std::collections::HashMap;

use crate::models::{
    BudgetLine, BudgetLineSummary, BudgetOverview, BudgetStatus, CategoryGroup, DashboardSummary,
    ExpenseShare, Goal, GoalProgress, GoalStatus, Totals, Transaction,
};

/// Sum income (positive amounts) and expenses (absolute value of the rest)
pub fn calculate_totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .fold(Totals::default(), |mut acc, transaction| {
            if transaction.amount > 0.0 {
                acc.total_income += transaction.amount;
            } else {
                acc.total_expenses += transaction.amount.abs();
            }
            acc
        })
}

/// Group expense transactions by exact category label
///
/// Groups are ordered by descending absolute total. Equal totals keep the order
/// in which their category was first encountered.
pub fn group_by_category(transactions: &[Transaction]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.is_expense()) {
        let slot = *index
            .entry(transaction.category.as_str())
            .or_insert_with(|| {
                groups.push(CategoryGroup {
                    category: transaction.category.clone(),
                    total: 0.0,
                    transactions: Vec::new(),
                });
                groups.len() - 1
            });

        let group = &mut groups[slot];
        group.total += transaction.amount;
        group.transactions.push(transaction.clone());
    }

    // sort_by is stable
    groups.sort_by(|a, b| b.total.abs().total_cmp(&a.total.abs()));
    groups
}

/// Expense breakdown chart data, in the same order as `groups`
pub fn expense_breakdown(groups: &[CategoryGroup]) -> Vec<ExpenseShare> {
    let total: f64 = groups.iter().map(|g| g.total.abs()).sum();

    groups
        .iter()
        .map(|group| {
            let amount = group.total.abs();
            ExpenseShare {
                category: group.category.clone(),
                amount,
                percentage: if total > 0.0 {
                    amount / total * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Funding progress for each goal, in input order
pub fn goal_progress(goals: &[Goal]) -> Vec<GoalProgress> {
    goals
        .iter()
        .map(|goal| {
            let percent = if goal.target_amount > 0.0 {
                let raw = (goal.current_amount / goal.target_amount * 100.0).round();
                raw.clamp(0.0, 100.0) as u32
            } else {
                100
            };

            GoalProgress {
                goal_id: goal.id.clone(),
                name: goal.name.clone(),
                percent,
                remaining: (goal.target_amount - goal.current_amount).max(0.0),
                status: GoalStatus::from_percent(percent),
            }
        })
        .collect()
}

/// Build budget lines from category groups and per-category budgets
///
/// `spent` is the absolute total of the group whose label matches exactly,
/// or zero when there were no expenses in that category.
pub fn budget_lines(groups: &[CategoryGroup], budgets: &[(String, f64)]) -> Vec<BudgetLine> {
    budgets
        .iter()
        .map(|(name, budgeted)| BudgetLine {
            name: name.clone(),
            spent: groups
                .iter()
                .find(|g| &g.category == name)
                .map(|g| g.total.abs())
                .unwrap_or(0.0),
            budgeted: *budgeted,
        })
        .collect()
}

/// Monthly budget overview with per-line percentages
pub fn budget_overview(lines: &[BudgetLine]) -> BudgetOverview {
    let total_spent: f64 = lines.iter().map(|l| l.spent).sum();
    let total_budgeted: f64 = lines.iter().map(|l| l.budgeted).sum();

    let lines = lines
        .iter()
        .map(|line| {
            let percent = percent_of(line.spent, line.budgeted);
            BudgetLineSummary {
                name: line.name.clone(),
                spent: line.spent,
                budgeted: line.budgeted,
                percent,
                status: BudgetStatus::from_percent(percent),
            }
        })
        .collect();

    BudgetOverview {
        lines,
        total_spent,
        total_budgeted,
        percent_spent: percent_of(total_spent, total_budgeted),
    }
}

/// Everything the dashboard cards need from one transaction/goal set
pub fn summarize(transactions: &[Transaction], goals: &[Goal]) -> DashboardSummary {
    let totals = calculate_totals(transactions);
    let groups = group_by_category(transactions);
    let breakdown = expense_breakdown(&groups);

    DashboardSummary {
        net: totals.net(),
        totals,
        groups,
        breakdown,
        goals: goal_progress(goals),
    }
}

/// Rounded percentage, zero when the denominator is not positive
fn percent_of(part: f64, whole: f64) -> u32 {
    if whole > 0.0 {
        (part / whole * 100.0).round().max(0.0) as u32
    } else {
        0
    }
}
