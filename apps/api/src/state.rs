use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::candidates::pipeline::ResumePipeline;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Extraction + scoring, wired once at startup.
    pub pipeline: ResumePipeline,
    pub config: Config,
}
