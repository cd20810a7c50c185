use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub staging: String,
    pub model: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let staging_status = match tokio::fs::metadata(state.staging.root()).await {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => "ready",
        Ok(_) => "read-only",
        // Created on the next session
        Err(_) => "missing",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        staging: staging_status.to_string(),
        model: state.analysis.dispatcher().model().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
