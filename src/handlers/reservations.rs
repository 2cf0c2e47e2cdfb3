// src/handlers/reservations.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, extract::{AppJson, AppPath, AppQuery}},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::reservation::{
        ConfirmReservationPayload, CreateReservationPayload, CreateReservationResponse,
        RejectReservationPayload, Reservation, ReservationDetail, ReservationQuery,
    },
};

// POST /api/reservations
#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "Reservations",
    request_body = CreateReservationPayload,
    responses(
        (status = 201, description = "Reserva PENDING criada e vagas seguradas", body = CreateReservationResponse),
        (status = 400, description = "Data indisponível ou capacidade insuficiente"),
        (status = 404, description = "Tour não encontrado")
    )
)]
pub async fn create_reservation(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<CreateReservationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let created = app_state
        .reservations
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/reservations
#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "Reservations",
    params(ReservationQuery),
    responses(
        (status = 200, description = "Reservas (mais recentes primeiro)", body = Vec<Reservation>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reservations(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppQuery(query): AppQuery<ReservationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = app_state
        .reservations
        .list(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(reservations))
}

// GET /api/reservations/{id}
#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    tag = "Reservations",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva com tour e cliente", body = ReservationDetail),
        (status = 404, description = "Reserva não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reservation(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .reservations
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(detail))
}

// POST /api/reservations/{id}/confirm
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/confirm",
    tag = "Reservations",
    request_body = ConfirmReservationPayload,
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva CONFIRMED", body = Reservation),
        (status = 409, description = "Reserva não está PENDING")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_reservation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    payload: Option<AppJson<ConfirmReservationPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|AppJson(p)| p).unwrap_or_default();

    let reservation = app_state
        .reservations
        .confirm(id, user.0.id, payload.vehicle_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(reservation))
}

// POST /api/reservations/{id}/reject
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/reject",
    tag = "Reservations",
    request_body = RejectReservationPayload,
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva CANCELLED e vagas devolvidas", body = Reservation),
        (status = 409, description = "Reserva não está PENDING")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_reservation(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    payload: Option<AppJson<RejectReservationPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|AppJson(p)| p).unwrap_or_default();

    let reservation = app_state
        .reservations
        .reject(id, payload.reason.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(reservation))
}
