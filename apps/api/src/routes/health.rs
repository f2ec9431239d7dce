use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::db;
use crate::state::AppState;

/// GET /api/health
/// Reports database reachability and whether the third-party API keys are set.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let database = if db::ping(&state.db).await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "time": Utc::now().to_rfc3339(),
        "database": database,
        "llmwhisperer_key": key_state(&state.config.llmwhisperer_api_key),
        "openrouter_key": key_state(&state.config.openrouter_api_key),
    }))
}

fn key_state(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "Set"
    } else {
        "Missing"
    }
}
