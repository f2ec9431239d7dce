use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::candidates::record::{CandidateRecord, ReviewStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub candidate_id: Uuid,
    pub job_id: String,
    pub job_title: Option<String>,
    pub filename: String,
    pub resume_s3_key: Option<String>,
    pub status: String,
    pub review_status: String,
    pub match_score: i32,
    pub recommendation: String,
    pub key_strengths: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skills_found: Vec<String>,
    pub experience_summary: String,
    pub education: String,
    pub estimated_experience_years: f64,
    pub reasoning: String,
    pub analysis: String,
    pub resume_text: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct Statistics {
    pub total_jobs: i64,
    pub total_candidates: i64,
    pub pending_reviews: i64,
    pub shortlisted: i64,
    pub jobs_with_candidates: i64,
}

pub async fn insert_candidate(
    pool: &PgPool,
    record: &CandidateRecord,
    resume_s3_key: Option<&str>,
) -> Result<(), sqlx::Error> {
    let result = &record.result;

    sqlx::query(
        r#"
        INSERT INTO candidates
            (candidate_id, job_id, job_title, filename, resume_s3_key, status, review_status,
             match_score, recommendation, key_strengths, missing_skills, skills_found,
             experience_summary, education, estimated_experience_years, reasoning,
             analysis, resume_text, uploaded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(record.candidate_id)
    .bind(&record.job_id)
    .bind(&record.job_title)
    .bind(&record.filename)
    .bind(resume_s3_key)
    .bind(record.status.as_str())
    .bind(ReviewStatus::Pending.as_str())
    .bind(result.match_score as i32)
    .bind(result.recommendation.as_str())
    .bind(&result.key_strengths)
    .bind(&result.missing_skills)
    .bind(&result.skills_found)
    .bind(&result.experience_summary)
    .bind(&result.education)
    .bind(result.estimated_experience_years)
    .bind(&result.reasoning)
    .bind(&record.analysis)
    .bind(&record.resume_text)
    .bind(record.uploaded_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Highest match score first; optionally restricted to one job.
pub async fn list_candidates(
    pool: &PgPool,
    job_id: Option<&str>,
) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT * FROM candidates
        WHERE ($1::text IS NULL OR job_id = $1)
        ORDER BY match_score DESC, uploaded_at DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

pub async fn top_candidates(
    pool: &PgPool,
    job_id: &str,
    limit: i64,
) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        "SELECT * FROM candidates WHERE job_id = $1 ORDER BY match_score DESC, uploaded_at DESC LIMIT $2",
    )
    .bind(job_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn get_candidate(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Option<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE candidate_id = $1")
        .bind(candidate_id)
        .fetch_optional(pool)
        .await
}

/// The only mutation a stored candidate ever sees.
pub async fn update_review_status(
    pool: &PgPool,
    candidate_id: Uuid,
    review_status: ReviewStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE candidates SET review_status = $1, updated_at = now() WHERE candidate_id = $2",
    )
    .bind(review_status.as_str())
    .bind(candidate_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn statistics(pool: &PgPool) -> Result<Statistics, sqlx::Error> {
    sqlx::query_as::<_, Statistics>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM jobs WHERE status = 'active') AS total_jobs,
            (SELECT COUNT(*) FROM candidates) AS total_candidates,
            (SELECT COUNT(*) FROM candidates WHERE review_status = 'pending') AS pending_reviews,
            (SELECT COUNT(*) FROM candidates WHERE review_status = 'shortlisted') AS shortlisted,
            (SELECT COUNT(DISTINCT job_id) FROM candidates) AS jobs_with_candidates
        "#,
    )
    .fetch_one(pool)
    .await
}
