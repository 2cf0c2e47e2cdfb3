// src/handlers/availability.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{AppJson, AppQuery},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::availability::{AvailabilityQuery, SetAvailabilityPayload, TourAvailability},
};

// GET /api/availability
#[utoipa::path(
    get,
    path = "/api/availability",
    tag = "Availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Datas configuradas", body = Vec<TourAvailability>)
    )
)]
pub async fn list_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let slots = app_state
        .ledger
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(slots))
}

// POST /api/availability
#[utoipa::path(
    post,
    path = "/api/availability",
    tag = "Availability",
    request_body = SetAvailabilityPayload,
    responses(
        (status = 201, description = "Datas abertas ou reconfiguradas", body = Vec<TourAvailability>),
        (status = 400, description = "Capacidade menor que as vagas já reservadas")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<SetAvailabilityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let slots = app_state
        .ledger
        .set_availability(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tracing::debug!("Disponibilidade alterada por {}", user.0.email);
    Ok((StatusCode::CREATED, Json(slots)))
}
