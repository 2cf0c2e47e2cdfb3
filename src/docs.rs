// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Site ---
        handlers::site::health,
        handlers::site::stats,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Catálogo ---
        handlers::tours::list_tours,
        handlers::tours::get_tour,
        handlers::tours::create_tour,
        handlers::tours::update_tour,
        handlers::tours::delete_tour,
        handlers::vehicles::list_vehicles,
        handlers::vehicles::create_vehicle,

        // --- Disponibilidade ---
        handlers::availability::list_availability,
        handlers::availability::set_availability,

        // --- Reservas ---
        handlers::reservations::create_reservation,
        handlers::reservations::list_reservations,
        handlers::reservations::get_reservation,
        handlers::reservations::confirm_reservation,
        handlers::reservations::reject_reservation,
        handlers::payments::payment_webhook,

        // --- Caixa de entrada ---
        handlers::messages::create_message,
        handlers::messages::list_messages,
        handlers::messages::mark_message_read,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,

        // --- Cotação ---
        handlers::quotes::create_quote,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::tour::Tour,
            models::tour::TourDetail,
            models::tour::Vehicle,
            models::tour::SiteStats,
            models::tour::CreateTourPayload,
            models::tour::UpdateTourPayload,
            models::tour::CreateVehiclePayload,

            // --- Disponibilidade ---
            models::availability::TourAvailability,
            models::availability::SetAvailabilityPayload,

            // --- Reservas ---
            models::reservation::ReservationStatus,
            models::reservation::PaymentStatus,
            models::reservation::PaymentProvider,
            models::reservation::PaymentMethod,
            models::reservation::Client,
            models::reservation::Reservation,
            models::reservation::Payment,
            models::reservation::ReservationDetail,
            models::reservation::ClientPayload,
            models::reservation::CreateReservationPayload,
            models::reservation::CreateReservationResponse,
            models::reservation::ConfirmReservationPayload,
            models::reservation::RejectReservationPayload,
            models::reservation::PaymentWebhookPayload,
            models::reservation::PaymentWebhookResponse,

            // --- Mensagens e notificações ---
            models::message::MessageChannel,
            models::message::Message,
            models::message::CreateMessagePayload,
            models::message::MarkReadPayload,
            models::notification::NotificationType,
            models::notification::Notification,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Cotação ---
            models::quote::QuoteItemInput,
            models::quote::QuoteContact,
            models::quote::QuoteRequest,
            models::quote::QuoteResponse,
        )
    ),
    tags(
        (name = "Site", description = "Saúde da API e números do site"),
        (name = "Auth", description = "Login da equipe"),
        (name = "Tours", description = "Catálogo de tours"),
        (name = "Vehicles", description = "Frota"),
        (name = "Availability", description = "Vagas por tour e data"),
        (name = "Reservations", description = "Ciclo de vida das reservas"),
        (name = "Payments", description = "Retorno dos provedores de pagamento"),
        (name = "Messages", description = "Caixa de entrada multicanal"),
        (name = "Notifications", description = "Notificações internas"),
        (name = "Quotes", description = "Cotação via WhatsApp")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
