//! Domain models for Penny
//!
//! Records arrive from the persistence collaborator (or the HTTP body) as JSON
//! with camelCase field names. Derived aggregates are recomputed on every call
//! and never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single income (positive) or expense (negative) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    /// Signed currency value: negative = expense, positive = income
    pub amount: f64,
    /// Grouping label, used verbatim (case-sensitive)
    #[serde(default)]
    pub category: String,
    /// ISO date or timestamp; the first 10 characters are the calendar date
    #[serde(default)]
    pub date: String,
    /// Merchant or display string
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    pub fn new(id: &str, amount: f64, category: &str, date: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            amount,
            category: category.to_string(),
            date: date.to_string(),
            description: description.to_string(),
        }
    }

    /// First 10 characters of `date` (the `YYYY-MM-DD` part of a timestamp)
    pub fn date_prefix(&self) -> String {
        self.date.chars().take(10).collect()
    }

    /// Calendar date, if the date prefix parses as `YYYY-MM-DD`
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_prefix(), "%Y-%m-%d").ok()
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

/// A savings goal (over-funding is allowed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
}

impl Goal {
    pub fn new(id: &str, name: &str, target_amount: f64, current_amount: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target_amount,
            current_amount,
        }
    }
}

/// Income and expense sums for a set of transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of positive amounts
    pub total_income: f64,
    /// Sum of absolute values of non-positive amounts
    pub total_expenses: f64,
}

impl Totals {
    /// Income minus expenses (equals the plain sum of all amounts)
    pub fn net(&self) -> f64 {
        self.total_income - self.total_expenses
    }
}

/// All expense transactions sharing one category label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    /// Sum of member amounts (always <= 0)
    pub total: f64,
    pub transactions: Vec<Transaction>,
}

/// One slice of the expense breakdown chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseShare {
    pub category: String,
    /// Positive amount spent in this category
    pub amount: f64,
    /// Share of total expenses, 0-100
    pub percentage: f64,
}

/// Progress band for a savings goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Under 30% funded
    Behind,
    /// 30% to under 70% funded
    OnTrack,
    /// 70% to under 100% funded
    NearlyThere,
    /// Fully funded (or over-funded)
    Complete,
}

impl GoalStatus {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            p if p >= 100 => Self::Complete,
            p if p >= 70 => Self::NearlyThere,
            p if p >= 30 => Self::OnTrack,
            _ => Self::Behind,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behind => "behind",
            Self::OnTrack => "on_track",
            Self::NearlyThere => "nearly_there",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived progress for one goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal_id: String,
    pub name: String,
    /// Rounded and clamped to 0-100
    pub percent: u32,
    /// Amount still needed (never negative)
    pub remaining: f64,
    pub status: GoalStatus,
}

/// A budgeted category with what has been spent against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub name: String,
    pub spent: f64,
    pub budgeted: f64,
}

/// Spending level of a budget line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Under 80% of budget
    Ok,
    /// 80% to under 100%
    Warning,
    /// At or over budget
    Over,
}

impl BudgetStatus {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            p if p >= 100 => Self::Over,
            p if p >= 80 => Self::Warning,
            _ => Self::Ok,
        }
    }
}

/// A budget line with its derived percentage and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLineSummary {
    pub name: String,
    pub spent: f64,
    pub budgeted: f64,
    pub percent: u32,
    pub status: BudgetStatus,
}

/// Monthly budget overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOverview {
    pub lines: Vec<BudgetLineSummary>,
    pub total_spent: f64,
    pub total_budgeted: f64,
    pub percent_spent: u32,
}

/// Everything the dashboard derives from one transaction/goal set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub totals: Totals,
    pub net: f64,
    pub groups: Vec<CategoryGroup>,
    pub breakdown: Vec<ExpenseShare>,
    pub goals: Vec<GoalProgress>,
}

/// Notification toggles stored in `user_settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub daily_tips: bool,
    #[serde(default = "default_true")]
    pub budget_alerts: bool,
    #[serde(default = "default_true")]
    pub goal_reminders: bool,
    #[serde(default)]
    pub monthly_reports: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            daily_tips: true,
            budget_alerts: true,
            goal_reminders: true,
            monthly_reports: false,
        }
    }
}

/// A user's settings record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            notifications: NotificationPreferences::default(),
        }
    }
}

/// Inbound request for a financial tip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipRequest {
    pub goals: Vec<Goal>,
    pub transactions: Vec<Transaction>,
    pub balance: f64,
}

impl TipRequest {
    /// Parse a raw request body into a typed request
    ///
    /// `goals` and `transactions` must be arrays of records and `balance` must
    /// be a JSON number. Anything else is a `Validation` error.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::Validation(e.to_string()))
    }
}

/// Generated financial tip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipResult {
    pub tip: String,
    pub category: String,
}

/// Inbound request for a dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl SummaryRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::Validation(e.to_string()))
    }
}
