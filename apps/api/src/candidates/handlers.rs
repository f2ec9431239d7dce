//! Axum route handlers for resumes and candidates.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::candidates::record::{CandidateRecord, ReviewStatus};
use crate::candidates::repository::{self, CandidateRow, Statistics};
use crate::errors::AppError;
use crate::jobs::repository::get_job;
use crate::state::AppState;
use crate::storage::{is_allowed_resume, sanitize_filename, store_resume, ALLOWED_RESUME_EXTENSIONS};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub success: bool,
    pub message: String,
    pub candidate: CandidateRecord,
}

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<CandidateRow>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewStatusUpdate {
    pub status: ReviewStatus,
}

/// Fields pulled out of the resume upload form.
struct ResumeUpload {
    filename: String,
    bytes: Bytes,
    job_id: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/upload-resume
///
/// Multipart form with `file` and `job_id`. Stores the file, runs extraction and
/// scoring, persists the candidate. Extraction failures still return 200 with a
/// `status: "error"` candidate.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let upload = read_resume_upload(multipart).await?;
    info!(
        "Resume upload: job_id={}, file={}",
        upload.job_id, upload.filename
    );

    let job = get_job(&state.db, &upload.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", upload.job_id)))?;

    let s3_key = store_resume(
        &state.s3,
        &state.config.s3_bucket,
        &upload.filename,
        upload.bytes.clone(),
    )
    .await?;

    let candidate = state
        .pipeline
        .submit_resume_for_scoring(upload.bytes, &upload.filename, &job)
        .await;

    repository::insert_candidate(&state.db, &candidate, Some(&s3_key)).await?;
    info!("Saved candidate: {}", candidate.candidate_id);

    Ok(Json(UploadResumeResponse {
        success: true,
        message: "Resume processed successfully!".to_string(),
        candidate,
    }))
}

/// GET /api/candidates?job_id=
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<CandidateQuery>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let job_id = params.job_id.as_deref().filter(|id| !id.is_empty());
    let candidates = repository::list_candidates(&state.db, job_id).await?;
    Ok(Json(CandidateListResponse { candidates }))
}

/// GET /api/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidateRow>, AppError> {
    let candidate = repository::get_candidate(&state.db, candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    Ok(Json(candidate))
}

/// PATCH /api/candidates/:id/status
pub async fn handle_update_review_status(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Json(request): Json<ReviewStatusUpdate>,
) -> Result<StatusCode, AppError> {
    if !repository::update_review_status(&state.db, candidate_id, request.status).await? {
        return Err(AppError::NotFound(format!(
            "Candidate {candidate_id} not found"
        )));
    }
    info!("Candidate {candidate_id} marked {}", request.status);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<Statistics>, AppError> {
    Ok(Json(repository::statistics(&state.db).await?))
}

async fn read_resume_upload(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut job_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
                file = Some((filename, bytes));
            }
            Some("job_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read job_id: {e}")))?;
                job_id = Some(text.trim().to_string()).filter(|id| !id.is_empty());
            }
            _ => {}
        }
    }

    let (Some((raw_filename, bytes)), Some(job_id)) = (file, job_id) else {
        return Err(AppError::Validation("Missing file or job_id".to_string()));
    };

    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let filename = sanitize_filename(&raw_filename);
    if !is_allowed_resume(&filename) {
        return Err(AppError::Validation(format!(
            "Unsupported file type. Allowed: {}",
            ALLOWED_RESUME_EXTENSIONS.join(", ")
        )));
    }

    Ok(ResumeUpload {
        filename,
        bytes,
        job_id,
    })
}
