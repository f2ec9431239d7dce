//! Tolerant parser for model output that is supposed to be a JSON object.
//!
//! Models wrap JSON in code fences, prepend chatter, or append explanations.
//! `repair` strips fences, takes the outermost `{ ... }` span and parses it; if
//! nothing parses it returns the analysis-failed `MatchResult` as JSON instead of
//! an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::analysis::models::MatchResult;

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*|\s*```").expect("fence pattern is valid"));

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RepairError(#[from] serde_json::Error);

/// Never fails; unparsable text yields the fallback match result.
pub fn repair(raw: &str) -> Value {
    match try_repair(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not recover JSON from model output: {e}");
            MatchResult::analysis_failed(format!("AI failed to analyze: {e}")).to_value()
        }
    }
}

pub fn try_repair(raw: &str) -> Result<Value, RepairError> {
    let cleaned = strip_code_fences(raw.trim());

    let candidate = outermost_object(&cleaned).unwrap_or(cleaned.as_str());
    Ok(serde_json::from_str(candidate)?)
}

fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").into_owned()
}

/// From the first `{` to the last `}`, inclusive.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_json_is_unchanged() {
        let text = r#"{"match_score": 75, "key_strengths": ["Rust"], "nested": {"a": 1}}"#;
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(repair(text), expected);
    }

    #[test]
    fn test_strips_json_code_fence() {
        assert_eq!(
            repair("```json\n{\"match_score\":80}\n```"),
            json!({"match_score": 80})
        );
    }

    #[test]
    fn test_strips_bare_code_fence() {
        assert_eq!(
            repair("```\n{\"match_score\": 55}\n```"),
            json!({"match_score": 55})
        );
    }

    #[test]
    fn test_ignores_surrounding_chatter() {
        let text = "Sure! Here is the analysis:\n{\"match_score\": 61, \"recommendation\": \"Good Match\"}\nLet me know if you need more.";
        assert_eq!(
            repair(text),
            json!({"match_score": 61, "recommendation": "Good Match"})
        );
    }

    #[test]
    fn test_parses_whole_text_when_no_braces() {
        assert_eq!(repair("  [1, 2]  "), json!([1, 2]));
    }

    #[test]
    fn test_garbage_yields_fallback() {
        let value = repair("I could not read this resume, sorry.");
        assert_eq!(value["match_score"], 0);
        assert_eq!(value["recommendation"], "Analysis Failed");
        assert_eq!(value["key_strengths"], json!([]));
        assert!(value["reasoning"]
            .as_str()
            .unwrap()
            .starts_with("AI failed to analyze"));
    }

    #[test]
    fn test_truncated_object_yields_fallback() {
        let value = repair("{\"match_score\": 80, \"key_strengths\": [\"Rust\"");
        assert_eq!(value["recommendation"], "Analysis Failed");
    }

    #[test]
    fn test_try_repair_reports_error() {
        assert!(try_repair("not json at all").is_err());
    }
}
