// src/handlers/messages.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::ApiError, extract::{AppJson, AppQuery}},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::message::{CreateMessagePayload, MarkReadPayload, Message, MessageQuery},
};

// POST /api/messages
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    request_body = CreateMessagePayload,
    responses(
        (status = 201, description = "Mensagem registrada", body = Message)
    )
)]
pub async fn create_message(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<CreateMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let message = app_state
        .messages
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(message)))
}

// GET /api/messages
#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "Caixa de entrada", body = Vec<Message>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppQuery(query): AppQuery<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = app_state
        .messages
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(messages))
}

// PUT /api/messages
#[utoipa::path(
    put,
    path = "/api/messages",
    tag = "Messages",
    request_body = MarkReadPayload,
    responses(
        (status = 200, description = "Mensagem atualizada", body = Message),
        (status = 404, description = "Mensagem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_message_read(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppJson(payload): AppJson<MarkReadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let message = app_state
        .messages
        .mark_read(payload.id, payload.is_read)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(message))
}
