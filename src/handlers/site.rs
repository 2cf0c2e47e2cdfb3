// src/handlers/site.rs

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{config::AppState, models::tour::SiteStats};

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Site",
    responses((status = 200, description = "API no ar"))
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// GET /api/stats
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Site",
    responses((status = 200, description = "Números exibidos no site", body = SiteStats))
)]
pub async fn stats(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.catalog.stats())
}
