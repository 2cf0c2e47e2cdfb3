// src/handlers/payments.rs

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};

use crate::{
    common::{error::ApiError, extract::AppJson},
    config::AppState,
    middleware::i18n::Locale,
    models::reservation::{PaymentWebhookPayload, PaymentWebhookResponse},
};

const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

// POST /api/payments/webhook
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    tag = "Payments",
    request_body = PaymentWebhookPayload,
    params(
        ("x-webhook-secret" = Option<String>, Header, description = "Segredo compartilhado, quando configurado")
    ),
    responses(
        (status = 200, description = "Status do pagamento aplicado", body = PaymentWebhookResponse),
        (status = 400, description = "Campos obrigatórios ausentes"),
        (status = 409, description = "Transição de pagamento inválida")
    )
)]
pub async fn payment_webhook(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    AppJson(payload): AppJson<PaymentWebhookPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    app_state
        .reservations
        .verify_webhook_secret(secret)
        .map_err(|e| e.to_api_error(&locale))?;

    let reservation = app_state
        .reservations
        .handle_payment_webhook(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(PaymentWebhookResponse { success: true, reservation }))
}
