use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

const NOT_SPECIFIED: &str = "Not specified";

/// A job posting. `document` keeps the uploaded JSON verbatim; the scored fields
/// are lifted into columns on upsert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub job_id: String,
    pub title: Option<String>,
    pub required_skills: Option<Value>,
    pub experience_years: Option<Value>,
    pub document: Value,
    pub status: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub candidate_count: i64,
}

impl Job {
    pub fn title_or_unknown(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown")
    }

    /// Arrays are comma-joined; scalars are printed as-is.
    pub fn required_skills_display(&self) -> String {
        match &self.required_skills {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(scalar_display)
                .collect::<Vec<_>>()
                .join(", "),
            Some(value) if !is_blank(value) => scalar_display(value),
            _ => NOT_SPECIFIED.to_string(),
        }
    }

    pub fn experience_display(&self) -> String {
        match &self.experience_years {
            Some(value) if !is_blank(value) => scalar_display(value),
            _ => NOT_SPECIFIED.to_string(),
        }
    }
}

fn scalar_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// A job as uploaded, after id normalisation and before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub job_id: String,
    pub title: Option<String>,
    pub required_skills: Option<Value>,
    pub experience_years: Option<Value>,
    pub document: Value,
}

/// Accepts a single job object or an array of them.
pub fn parse_job_upload(bytes: &[u8]) -> Result<Vec<NewJob>, AppError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|_| AppError::Validation("Invalid JSON file".to_string()))?;

    let documents = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    documents
        .into_iter()
        .map(|doc| match doc {
            Value::Object(map) => Ok(normalize_job_document(map)),
            _ => Err(AppError::Validation(
                "Each job must be a JSON object".to_string(),
            )),
        })
        .collect()
}

/// `job_id` comes from `job_id`, then `id`, then a fresh UUID; `id` mirrors it.
pub fn normalize_job_document(mut map: Map<String, Value>) -> NewJob {
    let job_id = map
        .get("job_id")
        .or_else(|| map.get("id"))
        .and_then(id_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    map.insert("job_id".to_string(), Value::String(job_id.clone()));
    map.insert("id".to_string(), Value::String(job_id.clone()));

    let title = map
        .get("title")
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    NewJob {
        job_id,
        title,
        required_skills: map.get("required_skills").cloned(),
        experience_years: map.get("experience_years").cloned(),
        document: Value::Object(map),
    }
}

/// Ids may arrive as strings or numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn sample_job(title: &str, skills: Value, years: Value) -> Job {
    Job {
        job_id: "job-1".to_string(),
        title: Some(title.to_string()),
        required_skills: Some(skills),
        experience_years: Some(years),
        document: serde_json::json!({}),
        status: "active".to_string(),
        uploaded_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_id_preferred_over_id() {
        let job = normalize_job_document(
            json!({"job_id": "J-7", "id": "other", "title": "SRE"})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(job.job_id, "J-7");
        assert_eq!(job.document["id"], "J-7");
    }

    #[test]
    fn test_numeric_id_is_used_as_job_id() {
        let job = normalize_job_document(json!({"id": 42}).as_object().unwrap().clone());
        assert_eq!(job.job_id, "42");
        assert_eq!(job.document["job_id"], "42");
    }

    #[test]
    fn test_missing_ids_generate_uuid() {
        let job = normalize_job_document(json!({"title": "Data Engineer"}).as_object().unwrap().clone());
        assert!(Uuid::parse_str(&job.job_id).is_ok());
        assert_eq!(job.title.as_deref(), Some("Data Engineer"));
    }

    #[test]
    fn test_parse_upload_accepts_single_object() {
        let jobs = parse_job_upload(br#"{"job_id": "a", "title": "Backend"}"#).unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_parse_upload_accepts_array() {
        let jobs = parse_job_upload(
            br#"[{"job_id": "a", "required_skills": ["Rust"]}, {"id": "b", "experience_years": 3}]"#,
        )
        .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].required_skills, Some(json!(["Rust"])));
        assert_eq!(jobs[1].job_id, "b");
        assert_eq!(jobs[1].experience_years, Some(json!(3)));
    }

    #[test]
    fn test_parse_upload_rejects_invalid_json() {
        let err = parse_job_upload(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Invalid JSON file"));
    }

    #[test]
    fn test_parse_upload_rejects_scalars() {
        assert!(parse_job_upload(b"[1, 2]").is_err());
    }

    #[test]
    fn test_display_helpers() {
        let job = sample_job("Rust Engineer", json!(["Rust", "Tokio"]), json!(5));
        assert_eq!(job.required_skills_display(), "Rust, Tokio");
        assert_eq!(job.experience_display(), "5");

        let job = sample_job("Rust Engineer", json!("Rust, SQL"), json!(""));
        assert_eq!(job.required_skills_display(), "Rust, SQL");
        assert_eq!(job.experience_display(), "Not specified");
    }
}
