//! JSON parsing helpers for AI backend responses
//!
//! Models are told to answer with a bare JSON object but often wrap it in a
//! Markdown code fence anyway. The fence markers are stripped before a strict
//! parse; anything else around the object is a malformed response.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::TipResult;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```json\n?|```").expect("valid regex"))
}

/// Remove every "```json" / "```" marker and surrounding whitespace
pub fn strip_code_fences(response: &str) -> String {
    fence_regex().replace_all(response, "").trim().to_string()
}

/// Extract a non-empty string field
fn non_empty_string(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Parse the aggregated model output into a tip
///
/// Both `tip` and `category` must be present non-empty strings. Every failure
/// is `MalformedAIResponse` with the first 100 characters of `response`.
pub fn parse_tip_response(response: &str) -> Result<TipResult> {
    let cleaned = strip_code_fences(response);

    let parsed: serde_json::Value = serde_json::from_str(&cleaned).map_err(|e| {
        warn!(error = %e, raw = %response, "Failed to parse AI tip response");
        Error::malformed(response)
    })?;

    let mut object = match parsed {
        serde_json::Value::Object(map) => map,
        _ => {
            warn!(raw = %response, "AI tip response is not a JSON object");
            return Err(Error::malformed(response));
        }
    };

    match (
        non_empty_string(object.remove("tip")),
        non_empty_string(object.remove("category")),
    ) {
        (Some(tip), Some(category)) => Ok(TipResult { tip, category }),
        _ => {
            warn!(raw = %response, "AI tip response missing tip or category");
            Err(Error::malformed(response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_malformed(response: &str) {
        match parse_tip_response(response) {
            Err(Error::MalformedAIResponse { raw }) => {
                let expected: String = response.chars().take(100).collect();
                assert_eq!(raw, expected);
            }
            other => panic!("expected MalformedAIResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let result =
            parse_tip_response(r#"{"tip": "Automate your savings.", "category": "Savings"}"#)
                .unwrap();
        assert_eq!(result.tip, "Automate your savings.");
        assert_eq!(result.category, "Savings");
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "```json\n{\"tip\": \"Cook at home.\", \"category\": \"Spending\"}\n```";
        let result = parse_tip_response(response).unwrap();
        assert_eq!(result.tip, "Cook at home.");
        assert_eq!(result.category, "Spending");
    }

    #[test]
    fn test_parse_bare_fence_with_whitespace() {
        let response = "  ```\n{\"tip\": \"t\", \"category\": \"c\"}\n```  \n";
        let result = parse_tip_response(response).unwrap();
        assert_eq!(result.tip, "t");
    }

    #[test]
    fn test_parse_ignores_extra_keys() {
        let response = r#"{"tip": "t", "category": "c", "confidence": 0.9}"#;
        assert!(parse_tip_response(response).is_ok());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```json{}```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn test_rejects_empty_string() {
        assert_malformed("");
    }

    #[test]
    fn test_rejects_non_json() {
        assert_malformed("Here is a tip: save more money!");
    }

    #[test]
    fn test_rejects_missing_tip() {
        assert_malformed(r#"{"category": "Savings"}"#);
    }

    #[test]
    fn test_rejects_missing_category() {
        assert_malformed(r#"{"tip": "Save more"}"#);
    }

    #[test]
    fn test_rejects_empty_tip() {
        assert_malformed(r#"{"tip": "", "category": "Savings"}"#);
    }

    #[test]
    fn test_rejects_non_string_fields() {
        assert_malformed(r#"{"tip": 5, "category": "Savings"}"#);
        assert_malformed(r#"{"tip": "Save", "category": null}"#);
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert_malformed("[1, 2, 3]");
        assert_malformed("null");
    }

    #[test]
    fn test_rejects_text_around_json() {
        assert_malformed(r#"Sure! {"tip": "t", "category": "c"}"#);
    }

    #[test]
    fn test_malformed_raw_is_truncated() {
        let long = format!("not json {}", "x".repeat(300));
        assert_malformed(&long);
    }
}
