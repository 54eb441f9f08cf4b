use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::engine::{self, EvaluationRequest};
use crate::models::Evaluation;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    /// Loaded once at start-up and never mutated.
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    evaluated_at: DateTime<Utc>,
    #[serde(flatten)]
    evaluation: Evaluation,
}

/// Build the Axum router for the evaluation service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/settings", get(settings_handler))
        .route("/api/evaluate", post(evaluate_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /api/health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/settings
async fn settings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.settings.clone())
}

/// POST /api/evaluate
async fn evaluate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    engine::evaluate(&request, &state.settings)
        .map(|evaluation| {
            Json(EvaluateResponse {
                evaluated_at: Utc::now(),
                evaluation,
            })
        })
        .map_err(|e| {
            warn!("Rejected evaluation: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        })
}
