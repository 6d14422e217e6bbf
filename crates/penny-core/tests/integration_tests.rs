//! Integration tests for penny-core
//!
//! These tests exercise the full import → summarize → tip workflow.

use std::time::Duration;

use penny_core::{
    aggregate::{budget_lines, budget_overview, summarize},
    import::{parse_csv, parse_json},
    models::{BudgetStatus, GoalStatus, TipRequest},
    AIClient, Error, GenerationSettings, MockBackend, TipPipeline,
};

/// One month of checking-account activity
fn monthly_csv() -> &'static str {
    r#"Date,Description,Category,Amount
05/01/2024,Paycheck,Income,3500.00
05/02/2024,Rent,Housing,-1200.00
05/03/2024,Whole Foods,Groceries,-64.53
05/05/2024,Blue Bottle,Coffee,-5.25
05/09/2024,Trader Joe's,Groceries,-20.47
05/12/2024,Thai Palace,Dining,-42.80
05/15/2024,Paycheck,Income,3500.00
05/20/2024,Gas Station,Transportation,-45.10"#
}

fn pipeline(backend: MockBackend) -> TipPipeline {
    TipPipeline::new(AIClient::Mock(backend), &GenerationSettings::default())
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn test_import_and_summarize() {
    let transactions = parse_csv(monthly_csv().as_bytes()).expect("Failed to parse CSV");
    assert_eq!(transactions.len(), 8);

    let summary = summarize(&transactions, &[]);

    assert!((summary.totals.total_income - 7000.0).abs() < 1e-9);
    assert!((summary.totals.total_expenses - 1378.15).abs() < 1e-6);
    assert!((summary.net - 5621.85).abs() < 1e-6);

    let order: Vec<&str> = summary.groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(
        order,
        vec!["Housing", "Groceries", "Transportation", "Dining", "Coffee"]
    );

    let share_total: f64 = summary.breakdown.iter().map(|s| s.percentage).sum();
    assert!((share_total - 100.0).abs() < 1e-6);
}

#[test]
fn test_budget_from_imported_groups() {
    let transactions = parse_csv(monthly_csv().as_bytes()).unwrap();
    let summary = summarize(&transactions, &[]);

    let lines = budget_lines(
        &summary.groups,
        &[
            ("Housing".to_string(), 1200.0),
            ("Groceries".to_string(), 100.0),
            ("Dining".to_string(), 200.0),
        ],
    );
    let overview = budget_overview(&lines);

    assert_eq!(overview.lines[0].status, BudgetStatus::Over);
    assert_eq!(overview.lines[1].percent, 85);
    assert_eq!(overview.lines[1].status, BudgetStatus::Warning);
    assert_eq!(overview.lines[2].status, BudgetStatus::Ok);
}

#[test]
fn test_json_dashboard_with_goals() {
    let json = br#"{
        "balance": 8750.5,
        "transactions": [
            {"id": "1", "amount": -15.99, "category": "Entertainment", "date": "2024-05-04T09:00:00Z", "description": "Netflix"}
        ],
        "goals": [
            {"id": "g1", "name": "Emergency Fund", "targetAmount": 10000, "currentAmount": 7500},
            {"id": "g2", "name": "Vacation", "targetAmount": 3000, "currentAmount": 400}
        ]
    }"#;

    let data = parse_json(json).unwrap();
    let summary = summarize(&data.transactions, &data.goals);

    assert_eq!(summary.goals[0].percent, 75);
    assert_eq!(summary.goals[0].status, GoalStatus::NearlyThere);
    assert_eq!(summary.goals[1].percent, 13);
    assert_eq!(summary.goals[1].status, GoalStatus::Behind);
}

// =============================================================================
// Tip pipeline
// =============================================================================

#[tokio::test]
async fn test_tip_from_imported_data() {
    let data = parse_json(
        br#"{"balance": 250, "transactions": [{"amount": -80, "category": "Dining"}], "goals": []}"#,
    )
    .unwrap();

    let backend = MockBackend::with_fragments(&[
        "```json\n{\"tip\": \"Dining out is your largest expense; ",
        "try cooking twice more per week.\", ",
        "\"category\": \"Spending\"}\n```",
    ]);
    let tip = pipeline(backend.clone())
        .get_tip(&data.to_tip_request())
        .await
        .unwrap();

    assert_eq!(tip.category, "Spending");
    assert!(tip.tip.starts_with("Dining out"));

    let prompt = &backend.recorded_requests()[0].prompt;
    assert!(prompt.contains("User Balance: $250.00"));
    assert!(prompt.contains("Goals (0):"));
    assert!(prompt.contains("Recent Transactions (1):"));
}

#[tokio::test]
async fn test_concurrent_tips_are_independent() {
    let tips = pipeline(MockBackend::new());
    let request = TipRequest {
        goals: vec![],
        transactions: vec![],
        balance: 0.0,
    };

    let (a, b, c) = tokio::join!(
        tips.get_tip(&request),
        tips.get_tip(&request),
        tips.get_tip(&request)
    );
    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
}

#[tokio::test]
async fn test_stalled_upstream_respects_timeout() {
    let tips = pipeline(MockBackend::stalled()).with_timeout(Duration::from_millis(20));
    let request = TipRequest {
        goals: vec![],
        transactions: vec![],
        balance: 0.0,
    };

    let started = std::time::Instant::now();
    let err = tips.get_tip(&request).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
}
