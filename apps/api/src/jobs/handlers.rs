//! Axum route handlers for job postings.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::candidates::repository::{top_candidates, CandidateRow};
use crate::errors::AppError;
use crate::jobs::models::{parse_job_upload, Job, JobWithCount};
use crate::jobs::repository;
use crate::state::AppState;

const DEFAULT_TOP_LIMIT: i64 = 5;
const MAX_TOP_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct UploadJobsResponse {
    pub success: bool,
    pub message: String,
    pub job_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobWithCount>,
}

#[derive(Debug, Deserialize)]
pub struct TopCandidatesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TopCandidatesResponse {
    pub job_id: String,
    pub candidates: Vec<CandidateRow>,
}

/// POST /api/jobs, POST /api/upload-jobs
///
/// Multipart `file` holding a JSON job object or an array of them. Jobs are
/// upserted by `job_id`.
pub async fn handle_upload_jobs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadJobsResponse>, AppError> {
    let bytes = read_file_field(multipart).await?;
    let jobs = parse_job_upload(&bytes)?;

    let mut job_ids = Vec::with_capacity(jobs.len());
    for job in &jobs {
        repository::upsert_job(&state.db, job).await?;
        job_ids.push(job.job_id.clone());
    }

    info!("Upserted {} job(s)", job_ids.len());

    Ok(Json(UploadJobsResponse {
        success: true,
        message: format!("Successfully uploaded {} job(s)", job_ids.len()),
        job_ids,
    }))
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = repository::list_jobs(&state.db).await?;
    Ok(Json(JobListResponse { jobs }))
}

/// GET /api/jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job = repository::get_job(&state.db, &job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {job_id}")))?;
    Ok(Json(job))
}

/// DELETE /api/jobs/:job_id (soft delete)
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !repository::deactivate_job(&state.db, &job_id).await? {
        return Err(AppError::NotFound(format!("Job not found: {job_id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/jobs/:job_id/top-candidates?limit=5
pub async fn handle_top_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(params): Query<TopCandidatesQuery>,
) -> Result<Json<TopCandidatesResponse>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);
    let candidates = top_candidates(&state.db, &job_id, limit).await?;
    Ok(Json(TopCandidatesResponse { job_id, candidates }))
}

async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read file: {e}")));
        }
    }
    Err(AppError::Validation("No file provided".to_string()))
}
