// src/common/error.rs

use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::middleware::i18n::Locale;
use crate::services::quote_service::QuoteError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // Corpo, path ou query que nem chegou a ser desserializado
    #[error("Entrada malformada: {0}")]
    MalformedInput(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Assinatura do webhook inválida")]
    InvalidWebhookSecret,

    #[error("Tour não encontrado")]
    TourNotFound,

    #[error("Veículo não encontrado")]
    VehicleNotFound,

    #[error("Reserva não encontrada")]
    ReservationNotFound,

    #[error("{0} não encontrado")]
    ResourceNotFound(&'static str),

    #[error("Data indisponível")]
    DateUnavailable,

    #[error("Capacidade insuficiente")]
    NotEnoughCapacity,

    #[error("Grupo de {requested} excede o máximo do tour ({max})")]
    PartySizeExceeded { requested: i32, max: i32 },

    #[error("Capacidade {capacity} menor que as vagas já reservadas ({booked})")]
    CapacityBelowBooked { capacity: i32, booked: i32 },

    #[error("Transição inválida: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Cotação inválida: {0}")]
    Quote(#[from] QuoteError),

    #[error("Falha no provedor externo: {0}")]
    Upstream(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Corpo de erro devolvido ao cliente, já traduzido.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.error });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::MalformedInput(_)
            | AppError::DateUnavailable
            | AppError::NotEnoughCapacity
            | AppError::PartySizeExceeded { .. }
            | AppError::CapacityBelowBooked { .. }
            | AppError::Quote(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::InvalidWebhookSecret => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::TourNotFound
            | AppError::VehicleNotFound
            | AppError::ReservationNotFound
            | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            AppError::Upstream(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn localized_message(&self, es: bool) -> String {
        let pick = |en: &str, es_msg: &str| if es { es_msg.to_string() } else { en.to_string() };

        match self {
            AppError::ValidationError(_) => pick(
                "One or more fields are invalid.",
                "Uno o más campos son inválidos.",
            ),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::MalformedInput(_) => pick(
                "The request could not be read.",
                "No se pudo leer la solicitud.",
            ),
            AppError::InvalidCredentials => pick("Invalid credentials", "Credenciales inválidas"),
            AppError::InvalidToken => pick("Unauthorized", "No autorizado"),
            AppError::Forbidden => pick(
                "You are not allowed to perform this action",
                "No tienes permiso para realizar esta acción",
            ),
            AppError::InvalidWebhookSecret => {
                pick("Invalid webhook signature", "Firma del webhook inválida")
            }
            AppError::TourNotFound => pick("Tour not found", "Tour no encontrado"),
            AppError::VehicleNotFound => pick("Vehicle not found", "Vehículo no encontrado"),
            AppError::ReservationNotFound => {
                pick("Reservation not found", "Reserva no encontrada")
            }
            AppError::ResourceNotFound(what) => {
                if es {
                    format!("{what} no encontrado")
                } else {
                    format!("{what} not found")
                }
            }
            AppError::DateUnavailable => pick("Date not available", "Fecha no disponible"),
            AppError::NotEnoughCapacity => pick("Not enough capacity", "No hay suficiente cupo"),
            AppError::PartySizeExceeded { max, .. } => {
                if es {
                    format!("El tour admite como máximo {max} participantes")
                } else {
                    format!("This tour allows at most {max} participants")
                }
            }
            AppError::CapacityBelowBooked { booked, .. } => {
                if es {
                    format!("La capacidad no puede ser menor a los lugares ya reservados ({booked})")
                } else {
                    format!("Capacity cannot be lower than the seats already booked ({booked})")
                }
            }
            AppError::InvalidStateTransition { from, to } => {
                if es {
                    format!("La reserva no puede pasar de {from} a {to}")
                } else {
                    format!("Cannot move reservation from {from} to {to}")
                }
            }
            AppError::Quote(err) => err.to_string(),
            // Internos: nunca expõe detalhes ao cliente
            AppError::Upstream(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => pick(
                "An unexpected error occurred.",
                "Ocurrió un error inesperado.",
            ),
        }
    }

    pub fn to_api_error(self, locale: &Locale) -> ApiError {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro interno do servidor: {:?}", self);
        }

        let error = self.localized_message(locale.is_spanish());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::MalformedInput(reason) => Some(json!({ "reason": reason })),
            _ => None,
        };

        ApiError {
            status,
            error,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn capacity_errors_keep_public_messages() {
        let en = Locale::default();

        let api = AppError::DateUnavailable.to_api_error(&en);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Date not available");

        let api = AppError::NotEnoughCapacity.to_api_error(&en);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Not enough capacity");

        let api = AppError::TourNotFound.to_api_error(&en);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Tour not found");
    }

    #[test]
    fn messages_follow_locale() {
        let es = Locale("es".into());
        let api = AppError::NotEnoughCapacity.to_api_error(&es);
        assert_eq!(api.error, "No hay suficiente cupo");
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let err = AppError::InvalidStateTransition {
            from: "CONFIRMED".into(),
            to: "CONFIRMED".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = AppError::Upstream("stripe said no: sk_live_...".into())
            .to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("stripe"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("Name is required".into());
        errors.add("name", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["name"][0], "Name is required");
    }
}
