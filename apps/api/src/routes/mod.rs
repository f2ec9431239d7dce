pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// Resumes are scanned PDFs and photos; axum's 2 MB default is too small.
const UPLOAD_BODY_LIMIT: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_upload_jobs),
        )
        .route("/api/upload-jobs", post(jobs::handle_upload_jobs))
        .route(
            "/api/jobs/:job_id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        .route(
            "/api/jobs/:job_id/top-candidates",
            get(jobs::handle_top_candidates),
        )
        // Candidates
        .route(
            "/api/upload-resume",
            post(candidates::handle_upload_resume),
        )
        .route("/api/candidates", get(candidates::handle_list_candidates))
        .route(
            "/api/candidates/:id",
            get(candidates::handle_get_candidate),
        )
        .route(
            "/api/candidates/:id/status",
            patch(candidates::handle_update_review_status),
        )
        .route("/api/stats", get(candidates::handle_stats))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}
