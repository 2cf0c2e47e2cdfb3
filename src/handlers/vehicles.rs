// src/handlers/vehicles.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{error::{ApiError, AppError}, extract::AppJson},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::tour::{CreateVehiclePayload, Vehicle},
};

// GET /api/vehicles
#[utoipa::path(
    get,
    path = "/api/vehicles",
    tag = "Vehicles",
    responses(
        (status = 200, description = "Frota ativa", body = Vec<Vehicle>)
    )
)]
pub async fn list_vehicles(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.catalog.list_vehicles().await)
}

// POST /api/vehicles
#[utoipa::path(
    post,
    path = "/api/vehicles",
    tag = "Vehicles",
    request_body = CreateVehiclePayload,
    responses(
        (status = 201, description = "Veículo cadastrado", body = Vehicle)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AppJson(payload): AppJson<CreateVehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let vehicle = app_state
        .catalog
        .create_vehicle(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}
