// src/handlers/quotes.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::{error::ApiError, extract::AppJson},
    config::AppState,
    middleware::i18n::Locale,
    models::quote::{QuoteRequest, QuoteResponse},
};

// POST /api/quotes
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Quotes",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Mensagem e link do WhatsApp", body = QuoteResponse),
        (status = 400, description = "Cotação inválida")
    )
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<QuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quotes
        .submit(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(quote))
}
