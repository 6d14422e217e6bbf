//! Transaction file import
//!
//! Reads dashboard data from disk for the CLI. Two formats are accepted:
//!
//! - JSON: either a bare array of transactions, or an object with
//!   `transactions`, optional `goals`, and optional `balance`
//! - CSV: one transaction per row, columns matched by header name
//!   (`amount` required; `id`, `category`, `date`, `description` optional)

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Goal, TipRequest, Transaction};

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Transactions, goals, and balance loaded from one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
    /// Explicit balance from the file, if any
    pub balance: Option<f64>,
}

impl DashboardData {
    /// Balance to report: the explicit one, or the net of all transactions
    pub fn effective_balance(&self) -> f64 {
        self.balance
            .unwrap_or_else(|| self.transactions.iter().map(|t| t.amount).sum())
    }

    /// Build a tip request from this data
    pub fn to_tip_request(&self) -> TipRequest {
        TipRequest {
            goals: self.goals.clone(),
            transactions: self.transactions.clone(),
            balance: self.effective_balance(),
        }
    }
}

/// Load a JSON or CSV file, choosing the parser by extension
pub fn load_file(path: &Path) -> Result<DashboardData> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        Error::InvalidData(format!(
            "Unsupported file type: {} (expected .json or .csv)",
            path.display()
        ))
    })?;

    let data = match format {
        FileFormat::Json => parse_json(&fs::read(path)?)?,
        FileFormat::Csv => DashboardData {
            transactions: parse_csv(fs::File::open(path)?)?,
            ..Default::default()
        },
    };

    debug!(
        path = %path.display(),
        transactions = data.transactions.len(),
        goals = data.goals.len(),
        "Loaded dashboard data"
    );
    Ok(data)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawJson {
    Transactions(Vec<Transaction>),
    Dashboard {
        transactions: Vec<Transaction>,
        #[serde(default)]
        goals: Vec<Goal>,
        balance: Option<f64>,
    },
}

/// Parse dashboard data from JSON
pub fn parse_json(bytes: &[u8]) -> Result<DashboardData> {
    let raw: RawJson = serde_json::from_slice(bytes).map_err(|e| {
        Error::InvalidData(format!(
            "Expected a transaction array or an object with 'transactions': {}",
            e
        ))
    })?;

    Ok(match raw {
        RawJson::Transactions(transactions) => DashboardData {
            transactions,
            ..Default::default()
        },
        RawJson::Dashboard {
            transactions,
            goals,
            balance,
        } => DashboardData {
            transactions,
            goals,
            balance,
        },
    })
}

/// Column positions resolved from the header row
struct Columns {
    id: Option<usize>,
    amount: usize,
    category: Option<usize>,
    date: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            id: find("id"),
            amount: find("amount")
                .ok_or_else(|| Error::InvalidData("CSV is missing an 'amount' column".into()))?,
            category: find("category"),
            date: find("date"),
            description: find("description"),
        })
    }
}

/// Parse transactions from CSV
///
/// Rows without an `id` get `row-<n>` (1-based). Dates are normalized to
/// `YYYY-MM-DD`.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("");

        let amount_str = record
            .get(columns.amount)
            .ok_or_else(|| Error::InvalidData(format!("Row {}: missing amount", row)))?;
        let amount = parse_amount(amount_str)
            .map_err(|e| Error::InvalidData(format!("Row {}: {}", row, e)))?;

        let date = match field(columns.date) {
            "" => String::new(),
            raw => parse_date(raw)
                .map_err(|e| Error::InvalidData(format!("Row {}: {}", row, e)))?
                .format("%Y-%m-%d")
                .to_string(),
        };

        let id = match field(columns.id) {
            "" => format!("row-{}", row),
            id => id.to_string(),
        };

        transactions.push(Transaction::new(
            &id,
            amount,
            field(columns.category),
            &date,
            field(columns.description),
        ));
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Parse a date string in various common formats
///
/// ISO timestamps are accepted by their date part.
fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    let candidates = [s, s.get(..10).unwrap_or(s)];
    for candidate in candidates {
        for fmt in formats {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, fmt) {
                return Ok(date);
            }
        }
    }

    Err(format!("Unable to parse date: {}", s))
}

/// Parse an amount string, handling currency symbols, commas, and parentheses
fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(format!("Unable to parse amount: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("01/15/2024").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T08:30:00Z").unwrap(), expected);
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-123.45").unwrap(), -123.45);
        assert_eq!(parse_amount("(100.00)").unwrap(), -100.00);
        assert!(parse_amount("n/a").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("inf").is_err());
        assert!(parse_amount("-infinity").is_err());
    }

    #[test]
    fn test_parse_csv_rejects_non_finite_amount() {
        let csv = "amount\n-10\nNaN\n";
        match parse_csv(csv.as_bytes()) {
            Err(Error::InvalidData(msg)) => assert!(msg.starts_with("Row 2:"), "{msg}"),
            other => panic!("expected InvalidData, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_parse_csv() {
        let csv = "Date,Description,Category,Amount\n\
                   01/15/2024,NETFLIX.COM,Entertainment,-15.99\n\
                   2024-01-16,Paycheck,Income,\"$2,500.00\"\n";

        let transactions = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].id, "row-1");
        assert_eq!(transactions[0].date, "2024-01-15");
        assert_eq!(transactions[0].amount, -15.99);
        assert_eq!(transactions[0].category, "Entertainment");
        assert_eq!(transactions[1].amount, 2500.0);
    }

    #[test]
    fn test_parse_csv_keeps_ids_and_allows_missing_columns() {
        let csv = "id,amount\ntx-9,-3\n";
        let transactions = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(transactions[0].id, "tx-9");
        assert_eq!(transactions[0].category, "");
        assert_eq!(transactions[0].date, "");
    }

    #[test]
    fn test_parse_csv_requires_amount_column() {
        let csv = "date,description\n2024-01-01,Coffee\n";
        assert!(matches!(
            parse_csv(csv.as_bytes()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_parse_csv_bad_amount_reports_row() {
        let csv = "amount\n-1\nabc\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_parse_json_array() {
        let data = parse_json(br#"[{"id":"1","amount":-5,"category":"Coffee"}]"#).unwrap();
        assert_eq!(data.transactions.len(), 1);
        assert!(data.goals.is_empty());
        assert_eq!(data.effective_balance(), -5.0);
    }

    #[test]
    fn test_parse_json_object() {
        let json = br#"{
            "transactions": [{"amount": 100}, {"amount": -40}],
            "goals": [{"id": "g", "name": "Car", "targetAmount": 500, "currentAmount": 50}],
            "balance": 1200.5
        }"#;
        let data = parse_json(json).unwrap();
        assert_eq!(data.transactions.len(), 2);
        assert_eq!(data.goals[0].name, "Car");
        assert_eq!(data.effective_balance(), 1200.5);

        let request = data.to_tip_request();
        assert_eq!(request.balance, 1200.5);
        assert_eq!(request.goals.len(), 1);
    }

    #[test]
    fn test_parse_json_rejects_other_shapes() {
        assert!(parse_json(br#"{"goals": []}"#).is_err());
        assert!(parse_json(b"42").is_err());
    }

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("a.JSON")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("b.csv")), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_path(Path::new("c.txt")), None);
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.csv");
        fs::write(&path, "amount,category\n-10,Food\n").unwrap();

        let data = load_file(&path).unwrap();
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.balance, None);

        let bad = dir.path().join("tx.xlsx");
        fs::write(&bad, "").unwrap();
        assert!(load_file(&bad).is_err());
    }
}
