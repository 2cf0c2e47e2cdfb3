// src/services/payment_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reservation::{PaymentMethod, PaymentSession},
};

const STRIPE_API: &str = "https://api.stripe.com";
const MERCADOPAGO_API: &str = "https://api.mercadopago.com";

// Dados mínimos para abrir um checkout no provedor
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub reservation_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub title: String,
    pub client_email: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<PaymentSession, AppError>;
}

fn upstream(provider: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Upstream(format!("{provider}: {err}"))
}

// --- STRIPE ---

#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
}

impl StripeGateway {
    pub fn new(http: reqwest::Client, secret_key: String) -> Self {
        Self { http, secret_key, api_base: STRIPE_API.to_string() }
    }
}

/// Valor em centavos, como a API do Stripe espera.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AppError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| AppError::BadRequest(format!("invalid amount {amount}")))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<PaymentSession, AppError> {
        let amount = to_minor_units(request.amount)?.to_string();
        let reservation_id = request.reservation_id.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("description", request.title.as_str()),
            ("receipt_email", request.client_email.as_str()),
            ("metadata[reservationId]", reservation_id.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| upstream("stripe", e))?
            .error_for_status()
            .map_err(|e| upstream("stripe", e))?;

        let intent: StripeIntent = response.json().await.map_err(|e| upstream("stripe", e))?;

        Ok(PaymentSession {
            provider_id: intent.id,
            client_secret: intent.client_secret,
            checkout_url: None,
        })
    }
}

// --- MERCADO PAGO ---

#[derive(Clone)]
pub struct MercadoPagoGateway {
    http: reqwest::Client,
    access_token: String,
    app_url: String,
    api_base: String,
}

#[derive(Deserialize)]
struct MercadoPagoPreference {
    id: String,
    init_point: Option<String>,
}

impl MercadoPagoGateway {
    pub fn new(http: reqwest::Client, access_token: String, app_url: String) -> Self {
        Self {
            http,
            access_token,
            app_url: app_url.trim_end_matches('/').to_string(),
            api_base: MERCADOPAGO_API.to_string(),
        }
    }

    fn preference_body(&self, request: &CheckoutRequest) -> serde_json::Value {
        let amount = request.amount.to_f64().unwrap_or_default();
        json!({
            "items": [{
                "id": format!("reservation-{}", request.reservation_id),
                "title": request.title,
                "quantity": 1,
                "unit_price": amount,
                "currency_id": request.currency.to_uppercase(),
            }],
            "payer": { "email": request.client_email },
            "back_urls": {
                "success": format!("{}/reservas/confirmacion?reservationId={}", self.app_url, request.reservation_id),
                "failure": format!("{}/reservas/error", self.app_url),
                "pending": format!("{}/reservas/pendiente", self.app_url),
            },
            "auto_return": "approved",
            "external_reference": request.reservation_id.to_string(),
            "metadata": { "reservationId": request.reservation_id.to_string() },
        })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<PaymentSession, AppError> {
        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&self.preference_body(request))
            .send()
            .await
            .map_err(|e| upstream("mercadopago", e))?
            .error_for_status()
            .map_err(|e| upstream("mercadopago", e))?;

        let preference: MercadoPagoPreference =
            response.json().await.map_err(|e| upstream("mercadopago", e))?;

        Ok(PaymentSession {
            provider_id: preference.id,
            client_secret: None,
            checkout_url: preference.init_point,
        })
    }
}

// Escolhe o provedor pela forma de pagamento. MANUAL não abre sessão.
#[derive(Clone, Default)]
pub struct PaymentGateways {
    pub stripe: Option<Arc<dyn PaymentGateway>>,
    pub mercadopago: Option<Arc<dyn PaymentGateway>>,
}

impl PaymentGateways {
    pub fn for_method(&self, method: PaymentMethod) -> Result<Option<Arc<dyn PaymentGateway>>, AppError> {
        let gateway = match method {
            PaymentMethod::Manual => return Ok(None),
            PaymentMethod::Stripe => self.stripe.clone(),
            PaymentMethod::Mercadopago => self.mercadopago.clone(),
        };

        gateway
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Payment method '{}' is not available", method.as_str())))
    }
}
