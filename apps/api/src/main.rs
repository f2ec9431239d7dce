mod analysis;
mod candidates;
mod config;
mod db;
mod errors;
mod extraction;
mod jobs;
mod llm_client;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::scorer::LlmMatchScorer;
use crate::candidates::pipeline::ResumePipeline;
use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::WhispererClient;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruiter API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // S3 / MinIO for original resume files
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    if config.llmwhisperer_api_key.is_none() {
        warn!("LLMWHISPERER_API_KEY not set, resume extraction will fail");
    }
    if config.openrouter_api_key.is_none() {
        warn!("OPENROUTER_API_KEY not set, candidates will get the fallback analysis");
    }

    let extractor = Arc::new(WhispererClient::new(
        config.llmwhisperer_base_url.clone(),
        config.llmwhisperer_api_key.clone(),
    ));
    let llm = Arc::new(LlmClient::new(
        config.openrouter_base_url.clone(),
        config.openrouter_api_key.clone(),
    ));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let scorer = Arc::new(LlmMatchScorer::new(llm, config.resume_text_limit));
    let pipeline = ResumePipeline::new(extractor, scorer, config.poll_settings());

    let state = AppState {
        db: db.clone(),
        s3,
        pipeline,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "recruiter-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
