// src/services/reservation_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::ReservationRepository,
    models::reservation::{
        CreateReservationPayload, CreateReservationResponse, NewBooking, NewClient, PaymentStatus,
        PaymentWebhookPayload, Reservation, ReservationDetail, ReservationStatus,
    },
    services::{
        catalog_service::CatalogService,
        notification_service::{rejection_reason, NotificationService},
        payment_service::{CheckoutRequest, PaymentGateways},
    },
};

/// Ciclo de vida da reserva: PENDING -> CONFIRMED | CANCELLED.
///
/// A ordem é sempre validar, reservar vagas, gravar, abrir checkout e só
/// então notificar. Falha de notificação nunca desfaz a transição.
#[derive(Clone)]
pub struct ReservationService {
    repo: Arc<dyn ReservationRepository>,
    catalog: CatalogService,
    gateways: PaymentGateways,
    notifications: NotificationService,
    currency: String,
    webhook_secret: Option<String>,
}

impl ReservationService {
    pub fn new(
        repo: Arc<dyn ReservationRepository>,
        catalog: CatalogService,
        gateways: PaymentGateways,
        notifications: NotificationService,
        currency: String,
        webhook_secret: Option<String>,
    ) -> Self {
        Self { repo, catalog, gateways, notifications, currency, webhook_secret }
    }

    pub async fn create(&self, payload: CreateReservationPayload) -> Result<CreateReservationResponse, AppError> {
        payload.validate()?;

        let tour = self.catalog.find_active_tour(&payload.tour_id).await?;
        if payload.participants > tour.max_capacity {
            return Err(AppError::PartySizeExceeded {
                requested: payload.participants,
                max: tour.max_capacity,
            });
        }
        if let Some(vehicle_id) = &payload.vehicle_id {
            self.catalog.find_vehicle(vehicle_id).await?;
        }
        // Provedor resolvido antes de tocar nas vagas
        let gateway = self.gateways.for_method(payload.payment_method)?;

        // Preço congelado no momento da criação
        let total_price = tour.price * Decimal::from(payload.participants);
        let client_email = payload.client.email.clone();

        let (reservation, payment) = self
            .repo
            .create_booking(NewBooking {
                tour_id: tour.id.clone(),
                date: payload.date,
                time: payload.time,
                participants: payload.participants,
                total_price,
                currency: self.currency.clone(),
                payment_method: payload.payment_method,
                vehicle_id: payload.vehicle_id,
                client: NewClient {
                    name: payload.client.name,
                    email: payload.client.email,
                    phone: payload.client.phone,
                    country: payload.client.country,
                },
            })
            .await?;

        tracing::info!(
            "Reserva criada: {} ({} x{} em {})",
            reservation.id,
            tour.id,
            reservation.participants,
            reservation.date
        );

        let payment = match gateway {
            Some(gateway) => {
                let request = CheckoutRequest {
                    reservation_id: reservation.id,
                    amount: total_price,
                    currency: self.currency.clone(),
                    title: tour.title.clone(),
                    client_email,
                };
                let attached = match gateway.create_session(&request).await {
                    Ok(session) => self.repo.attach_payment_session(payment.id, &session).await,
                    Err(e) => Err(e),
                };
                match attached {
                    Ok(payment) => payment,
                    Err(e) => {
                        tracing::error!("Falha ao abrir checkout da reserva {}: {}", reservation.id, e);
                        if let Err(abort) = self
                            .repo
                            .abort_booking(reservation.id, "No se pudo iniciar el pago")
                            .await
                        {
                            tracing::error!("Falha ao desfazer reserva {}: {}", reservation.id, abort);
                        }
                        return Err(e);
                    }
                }
            }
            None => payment,
        };

        if let Some(detail) = self.load_detail(reservation.id).await {
            if let Err(e) = self.notifications.notify_new_reservation(&detail).await {
                tracing::warn!("Falha ao notificar nova reserva {}: {}", reservation.id, e);
            }
        }

        Ok(CreateReservationResponse { reservation, payment })
    }

    pub async fn get(&self, id: Uuid) -> Result<ReservationDetail, AppError> {
        self.repo.find_detail(id).await?.ok_or(AppError::ReservationNotFound)
    }

    pub async fn list(&self, status: Option<ReservationStatus>) -> Result<Vec<Reservation>, AppError> {
        self.repo.list(status).await
    }

    pub async fn confirm(&self, id: Uuid, user_id: Uuid, vehicle_id: Option<String>) -> Result<Reservation, AppError> {
        let vehicle_id = vehicle_id.filter(|v| !v.is_empty());
        if let Some(vehicle_id) = &vehicle_id {
            self.catalog.find_vehicle(vehicle_id).await?;
        }

        let reservation = self.repo.confirm(id, user_id, vehicle_id.as_deref()).await?;
        // Política do negócio, não bloqueia a confirmação
        if reservation.payment_status != PaymentStatus::Paid {
            tracing::warn!(
                "Reserva {} confirmada com pagamento {}",
                reservation.id,
                reservation.payment_status
            );
        }
        tracing::info!("Reserva confirmada: {} por {}", reservation.id, user_id);

        if let Some(detail) = self.load_detail(reservation.id).await {
            if let Err(e) = self.notifications.notify_reservation_confirmed(&detail).await {
                tracing::warn!("Falha ao notificar confirmação {}: {}", reservation.id, e);
            }
        }
        Ok(reservation)
    }

    pub async fn reject(&self, id: Uuid, reason: Option<&str>) -> Result<Reservation, AppError> {
        let reason = rejection_reason(reason);
        let reservation = self.repo.reject(id, &reason).await?;
        tracing::info!("Reserva rejeitada: {} ({})", reservation.id, reason);

        if let Some(detail) = self.load_detail(reservation.id).await {
            if let Err(e) = self.notifications.notify_reservation_rejected(&detail, &reason).await {
                tracing::warn!("Falha ao notificar rejeição {}: {}", reservation.id, e);
            }
        }
        Ok(reservation)
    }

    // --- WEBHOOK DE PAGAMENTO ---

    pub fn verify_webhook_secret(&self, provided: Option<&str>) -> Result<(), AppError> {
        match &self.webhook_secret {
            Some(expected) if provided != Some(expected.as_str()) => Err(AppError::InvalidWebhookSecret),
            _ => Ok(()),
        }
    }

    pub async fn handle_payment_webhook(&self, payload: PaymentWebhookPayload) -> Result<Reservation, AppError> {
        let (Some(reservation_id), Some(status)) = (payload.reservation_id, payload.payment_status) else {
            return Err(AppError::BadRequest("Missing required fields".into()));
        };

        let reservation = self
            .repo
            .find(reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)?;

        let current = reservation.payment_status;
        // Provedores reenviam o mesmo evento
        if current == status {
            tracing::debug!("Webhook repetido para {}: {}", reservation_id, status);
            return Ok(reservation);
        }
        current.ensure_transition(status)?;

        let updated = self
            .repo
            .update_payment_status(reservation_id, current, status, payload.transaction_id.as_deref())
            .await?;
        tracing::info!("Pagamento {} -> {} ({})", current, status, reservation_id);

        match status {
            PaymentStatus::Paid if updated.status != ReservationStatus::Pending => {
                tracing::warn!(
                    "Pagamento recebido para reserva {} já {}; requer reembolso manual",
                    reservation_id,
                    updated.status
                );
            }
            PaymentStatus::Paid => {
                if let Some(detail) = self.load_detail(reservation_id).await {
                    if let Err(e) = self.notifications.notify_payment_received(&detail).await {
                        tracing::warn!("Falha ao notificar pagamento {}: {}", reservation_id, e);
                    }
                }
            }
            PaymentStatus::Failed => {
                tracing::warn!("Pagamento falhou para {}; vagas continuam reservadas", reservation_id);
            }
            _ => {}
        }

        Ok(updated)
    }

    async fn load_detail(&self, id: Uuid) -> Option<ReservationDetail> {
        match self.repo.find_detail(id).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!("Falha ao carregar reserva {} para notificação: {}", id, e);
                None
            }
        }
    }
}
