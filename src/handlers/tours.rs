// src/handlers/tours.rs

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
        extract::{AppJson, AppPath},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::tour::{CreateTourPayload, Tour, TourDetail, UpdateTourPayload},
};

// GET /api/tours
#[utoipa::path(
    get,
    path = "/api/tours",
    tag = "Tours",
    responses(
        (status = 200, description = "Tours ativos (tour em destaque primeiro)", body = Vec<Tour>)
    )
)]
pub async fn list_tours(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.catalog.list_tours().await)
}

// GET /api/tours/{id}
#[utoipa::path(
    get,
    path = "/api/tours/{id}",
    tag = "Tours",
    params(("id" = String, Path, description = "Slug do tour")),
    responses(
        (status = 200, description = "Tour com as próximas datas abertas", body = TourDetail),
        (status = 404, description = "Tour não encontrado")
    )
)]
pub async fn get_tour(
    State(app_state): State<AppState>,
    locale: Locale,
    AppPath(id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .catalog
        .get_tour(&id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(detail))
}

// POST /api/tours
#[utoipa::path(
    post,
    path = "/api/tours",
    tag = "Tours",
    request_body = CreateTourPayload,
    responses(
        (status = 201, description = "Tour criado", body = Tour),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tour(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AppJson(payload): AppJson<CreateTourPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let tour = app_state
        .catalog
        .create_tour(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(tour)))
}

// PUT /api/tours/{id}
#[utoipa::path(
    put,
    path = "/api/tours/{id}",
    tag = "Tours",
    request_body = UpdateTourPayload,
    params(("id" = String, Path, description = "Slug do tour")),
    responses(
        (status = 200, description = "Tour atualizado", body = Tour),
        (status = 404, description = "Tour não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tour(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateTourPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let tour = app_state
        .catalog
        .update_tour(&id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(tour))
}

// DELETE /api/tours/{id}
#[utoipa::path(
    delete,
    path = "/api/tours/{id}",
    tag = "Tours",
    params(("id" = String, Path, description = "Slug do tour")),
    responses(
        (status = 204, description = "Tour desativado"),
        (status = 404, description = "Tour não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_tour(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AppPath(id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog
        .deactivate_tour(&id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
