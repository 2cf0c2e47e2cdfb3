// src/models/reservation.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "reservation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    // CONFIRMED e CANCELLED são terminais
    pub fn ensure_transition(self, to: ReservationStatus) -> Result<(), AppError> {
        match (self, to) {
            (ReservationStatus::Pending, ReservationStatus::Confirmed)
            | (ReservationStatus::Pending, ReservationStatus::Cancelled) => Ok(()),
            (from, to) => Err(AppError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    /// Transições aceitas vindas do provedor de pagamento.
    ///
    /// Um pagamento PAID só pode ser estornado; FAILED ainda pode ser pago
    /// numa segunda tentativa do cliente.
    pub fn ensure_transition(self, to: PaymentStatus) -> Result<(), AppError> {
        use PaymentStatus::*;
        match (self, to) {
            (Pending, Paid) | (Pending, Failed) | (Failed, Paid) | (Paid, Refunded) => Ok(()),
            (from, to) => Err(AppError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_provider", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    Stripe,
    Mercadopago,
    Manual,
}

// Forma de pagamento escolhida no checkout
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    #[default]
    Mercadopago,
    Manual,
}

impl PaymentMethod {
    pub fn provider(self) -> PaymentProvider {
        match self {
            PaymentMethod::Stripe => PaymentProvider::Stripe,
            PaymentMethod::Mercadopago => PaymentProvider::Mercadopago,
            PaymentMethod::Manual => PaymentProvider::Manual,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Mercadopago => "mercadopago",
            PaymentMethod::Manual => "manual",
        }
    }
}

// --- CLIENTES ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- RESERVAS ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,
    pub tour_id: String,
    pub client_id: Uuid,
    pub vehicle_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    pub participants: i32,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PAGAMENTOS ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub provider: PaymentProvider,
    pub provider_id: Option<String>,
    pub transaction_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Sessão aberta no provedor (client secret do Stripe, init_point do Mercado Pago)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub provider_id: String,
    pub client_secret: Option<String>,
    pub checkout_url: Option<String>,
}

// Reserva com tour e cliente carregados (usada nas notificações)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    pub reservation: Reservation,
    pub tour_title: String,
    pub client: Client,
    pub vehicle_name: Option<String>,
}

// Tudo o que o repositório precisa para gravar uma reserva nova de uma vez
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub tour_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub participants: i32,
    pub total_price: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub vehicle_id: Option<String>,
    pub client: NewClient,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: Option<String>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,

    #[validate(email(message = "A valid email is required."))]
    pub email: String,

    #[validate(length(min = 1, message = "Phone is required."))]
    pub phone: String,

    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationPayload {
    #[validate(length(min = 1, message = "tourId is required."))]
    pub tour_id: String,

    pub date: NaiveDate,

    #[serde(default)]
    pub time: String,

    #[validate(range(min = 1, message = "At least one participant is required."))]
    pub participants: i32,

    #[validate(nested)]
    pub client: ClientPayload,

    pub vehicle_id: Option<String>,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationResponse {
    pub reservation: Reservation,
    pub payment: Payment,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmReservationPayload {
    pub vehicle_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectReservationPayload {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
}

// Corpo do webhook de pagamento. Campos opcionais para devolver 400 legível.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhookPayload {
    pub reservation_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentWebhookResponse {
    pub success: bool,
    pub reservation: Reservation,
}
