//! Match scoring: asks the completion model to grade a resume against a job.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`. Scoring never fails: completion and
//! parsing problems come back as an analysis-failed `MatchResult`.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{info, warn};

use crate::analysis::models::MatchResult;
use crate::analysis::prompts::MATCH_PROMPT_TEMPLATE;
use crate::analysis::repair::repair;
use crate::jobs::models::Job;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::ChatCompletion;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(json_only|title|required_skills|experience_years|resume_text)\}")
        .expect("placeholder pattern is valid")
});

#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, resume_text: &str, job: &Job) -> MatchResult;
}

pub struct LlmMatchScorer {
    llm: Arc<dyn ChatCompletion>,
    resume_char_limit: usize,
}

impl LlmMatchScorer {
    pub fn new(llm: Arc<dyn ChatCompletion>, resume_char_limit: usize) -> Self {
        Self {
            llm,
            resume_char_limit,
        }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(&self, resume_text: &str, job: &Job) -> MatchResult {
        let prompt = build_prompt(resume_text, job, self.resume_char_limit);

        match self.llm.complete(&prompt).await {
            Ok(raw) => {
                let result = MatchResult::from_value(&repair(&raw));
                info!(
                    "AI analysis for job {}: match score {}",
                    job.job_id, result.match_score
                );
                result
            }
            Err(e) => {
                warn!("AI analysis error for job {}: {e}", job.job_id);
                MatchResult::analysis_failed(format!("AI failed to analyze: {e}"))
            }
        }
    }
}

/// Resume text beyond `resume_char_limit` characters is dropped, not rejected.
///
/// Placeholders are filled in one pass, so braces inside job fields or the resume
/// are copied verbatim.
pub fn build_prompt(resume_text: &str, job: &Job, resume_char_limit: usize) -> String {
    let title = job.title.as_deref().unwrap_or("Not specified");
    let required_skills = job.required_skills_display();
    let experience_years = job.experience_display();
    let resume = truncate_chars(resume_text, resume_char_limit);

    PLACEHOLDER_RE
        .replace_all(MATCH_PROMPT_TEMPLATE, |caps: &Captures| match &caps[1] {
            "json_only" => JSON_ONLY_INSTRUCTION.to_string(),
            "title" => title.to_string(),
            "required_skills" => required_skills.clone(),
            "experience_years" => experience_years.clone(),
            _ => resume.to_string(),
        })
        .into_owned()
}

/// Char-boundary safe prefix of at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
