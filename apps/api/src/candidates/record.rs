//! Candidate record builder. Pure data transformation, no I/O.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::models::MatchResult;
use crate::analysis::scorer::truncate_chars;
use crate::extraction::ExtractionError;
use crate::jobs::models::Job;

/// Only a short preview of the extracted text is persisted.
const RESUME_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Success,
    Error,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Success => "success",
            CandidateStatus::Error => "error",
        }
    }
}

/// Recruiter-owned review state; never touched by the scoring flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Reviewed => "reviewed",
            ReviewStatus::Shortlisted => "shortlisted",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processed resume submission. Created once, then handed to persistence.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub candidate_id: Uuid,
    pub job_id: String,
    pub job_title: String,
    pub filename: String,
    pub status: CandidateStatus,
    pub uploaded_at: DateTime<Utc>,
    /// Human-readable rendering of the analysis.
    pub analysis: String,
    pub resume_text: Option<String>,
    #[serde(flatten)]
    pub result: MatchResult,
}

pub fn build_candidate_record(
    outcome: &Result<String, ExtractionError>,
    match_result: Option<MatchResult>,
    job: &Job,
    filename: &str,
) -> CandidateRecord {
    let (status, result, analysis, resume_text) = match outcome {
        Err(error) => {
            let detail = error.to_string();
            (
                CandidateStatus::Error,
                MatchResult::parsing_failed(detail.clone()),
                format!("Failed to extract text: {detail}"),
                None,
            )
        }
        Ok(text) => {
            let result = match_result.unwrap_or_else(|| {
                MatchResult::analysis_failed("AI failed to analyze: no analysis was produced")
            });
            let analysis = render_analysis_text(&result);
            (
                CandidateStatus::Success,
                result,
                analysis,
                Some(truncate_chars(text, RESUME_PREVIEW_CHARS).to_string()),
            )
        }
    };

    CandidateRecord {
        candidate_id: Uuid::new_v4(),
        job_id: job.job_id.clone(),
        job_title: job.title_or_unknown().to_string(),
        filename: filename.to_string(),
        status,
        uploaded_at: Utc::now(),
        analysis,
        resume_text,
        result,
    }
}

/// Fixed display template; line order is relied on by the recruiter UI.
pub fn render_analysis_text(result: &MatchResult) -> String {
    format!(
        "Match Score: {score}/100\n\
         Recommendation: {recommendation}\n\
         \n\
         Key Strengths:\n\
         {strengths}\n\
         \n\
         Missing Skills:\n\
         {missing}\n\
         \n\
         Skills Found: {found}\n\
         \n\
         Experience: {experience}\n\
         Education: {education}\n\
         Years of Experience: {years}\n\
         \n\
         Reasoning: {reasoning}",
        score = result.match_score,
        recommendation = result.recommendation,
        strengths = bullets(&result.key_strengths),
        missing = bullets(&result.missing_skills),
        found = result.skills_found.join(", "),
        experience = result.experience_summary,
        education = result.education,
        years = result.estimated_experience_years,
        reasoning = result.reasoning,
    )
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
