// src/handlers/notifications.rs

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::ApiError, extract::{AppJson, AppQuery}},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        message::MarkReadPayload,
        notification::{Notification, NotificationQuery},
    },
};

// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Últimas 50 notificações", body = Vec<Notification>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppQuery(query): AppQuery<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = app_state
        .notifications
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(notifications))
}

// PUT /api/notifications
#[utoipa::path(
    put,
    path = "/api/notifications",
    tag = "Notifications",
    request_body = MarkReadPayload,
    responses(
        (status = 200, description = "Notificação atualizada", body = Notification),
        (status = 404, description = "Notificação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppJson(payload): AppJson<MarkReadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = app_state
        .notifications
        .mark_read(payload.id, payload.is_read)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(notification))
}
