use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Verdict attached to every scored (or unscorable) resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Match")]
    StrongMatch,
    #[serde(rename = "Good Match")]
    GoodMatch,
    #[serde(rename = "Moderate Match")]
    ModerateMatch,
    #[serde(rename = "Weak Match")]
    WeakMatch,
    /// Text was extracted but the model step produced nothing usable.
    #[serde(rename = "Analysis Failed")]
    AnalysisFailed,
    /// No text could be extracted from the document.
    #[serde(rename = "Parsing Failed")]
    ParsingFailed,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "Strong Match",
            Recommendation::GoodMatch => "Good Match",
            Recommendation::ModerateMatch => "Moderate Match",
            Recommendation::WeakMatch => "Weak Match",
            Recommendation::AnalysisFailed => "Analysis Failed",
            Recommendation::ParsingFailed => "Parsing Failed",
        }
    }

    /// Case-insensitive match on the display strings.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        [
            Recommendation::StrongMatch,
            Recommendation::GoodMatch,
            Recommendation::ModerateMatch,
            Recommendation::WeakMatch,
            Recommendation::AnalysisFailed,
            Recommendation::ParsingFailed,
        ]
        .into_iter()
        .find(|r| r.as_str().eq_ignore_ascii_case(raw))
    }

    /// Band used when the model's own label is missing or unrecognised.
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Recommendation::StrongMatch
        } else if score >= 60 {
            Recommendation::GoodMatch
        } else if score >= 40 {
            Recommendation::ModerateMatch
        } else {
            Recommendation::WeakMatch
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured comparison of one resume against one job. Always fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_score: u32,
    pub recommendation: Recommendation,
    pub key_strengths: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skills_found: Vec<String>,
    pub experience_summary: String,
    pub education: String,
    pub estimated_experience_years: f64,
    pub reasoning: String,
}

const NOT_AVAILABLE: &str = "N/A";

impl MatchResult {
    pub fn analysis_failed(detail: impl Into<String>) -> Self {
        Self {
            match_score: 0,
            recommendation: Recommendation::AnalysisFailed,
            key_strengths: vec![],
            missing_skills: vec![],
            skills_found: vec![],
            experience_summary: "Analysis error".to_string(),
            education: "Unknown".to_string(),
            estimated_experience_years: 0.0,
            reasoning: detail.into(),
        }
    }

    pub fn parsing_failed(detail: impl Into<String>) -> Self {
        Self {
            match_score: 0,
            recommendation: Recommendation::ParsingFailed,
            key_strengths: vec![],
            missing_skills: vec![],
            skills_found: vec![],
            experience_summary: String::new(),
            education: String::new(),
            estimated_experience_years: 0.0,
            reasoning: detail.into(),
        }
    }

    /// Lenient conversion from whatever JSON the model produced.
    /// Anything that is not an object becomes `analysis_failed`.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::analysis_failed(format!(
                "AI failed to analyze: expected a JSON object, got {}",
                json_kind(value)
            ));
        };

        let match_score = obj.get("match_score").map(score_from).unwrap_or(0);
        let recommendation = obj
            .get("recommendation")
            .and_then(|r| r.as_str())
            .and_then(Recommendation::parse)
            .unwrap_or_else(|| Recommendation::from_score(match_score));

        Self {
            match_score,
            recommendation,
            key_strengths: string_list(obj.get("key_strengths")),
            missing_skills: string_list(obj.get("missing_skills")),
            skills_found: string_list(obj.get("skills_found")),
            experience_summary: text_or_na(obj.get("experience_summary")),
            education: text_or_na(obj.get("education")),
            estimated_experience_years: obj
                .get("estimated_experience_years")
                .and_then(number_from)
                .filter(|y| y.is_finite() && *y >= 0.0)
                .unwrap_or(0.0),
            reasoning: text_or_na(obj.get("reasoning")),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "match_score": self.match_score,
            "recommendation": self.recommendation.as_str(),
            "key_strengths": self.key_strengths,
            "missing_skills": self.missing_skills,
            "skills_found": self.skills_found,
            "experience_summary": self.experience_summary,
            "education": self.education,
            "estimated_experience_years": self.estimated_experience_years,
            "reasoning": self.reasoning,
        })
    }
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn score_from(value: &Value) -> u32 {
    number_from(value)
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u32)
        .unwrap_or(0)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => vec![],
    }
}

fn text_or_na(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
