// src/services/notification_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message as EmailMessage, Tokio1Executor,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::{SmtpConfig, TwilioConfig},
    db::{NotificationRepository, UserRepository},
    models::{
        auth::UserRole,
        message::Message,
        notification::{NewNotification, Notification, NotificationQuery, NotificationType},
        reservation::ReservationDetail,
    },
};

const NOTIFICATION_LIST_LIMIT: i64 = 50;
const DEFAULT_REJECTION_REASON: &str = "Reserva rechazada por el guía";

/// Canais externos (WhatsApp e e-mail).
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send_whatsapp(&self, to: &str, body: &str) -> Result<(), AppError>;
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError>;
}

// Twilio via HTTP + SMTP via lettre. Canal sem configuração só registra no log.
pub struct LiveTransport {
    http: reqwest::Client,
    twilio: Option<TwilioConfig>,
    mailer: Option<(AsyncSmtpTransport<Tokio1Executor>, String)>,
}

impl LiveTransport {
    pub fn new(http: reqwest::Client, twilio: Option<TwilioConfig>, smtp: Option<SmtpConfig>) -> anyhow::Result<Self> {
        let mailer = match smtp {
            Some(smtp) => {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
                    .port(smtp.port)
                    .credentials(Credentials::new(smtp.user.clone(), smtp.password))
                    .build();
                let from = smtp.from.unwrap_or(smtp.user);
                Some((transport, from))
            }
            None => None,
        };

        Ok(Self { http, twilio, mailer })
    }
}

fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[async_trait]
impl NotificationTransport for LiveTransport {
    async fn send_whatsapp(&self, to: &str, body: &str) -> Result<(), AppError> {
        let Some(twilio) = &self.twilio else {
            tracing::info!("WhatsApp não configurado, ignorando mensagem para {}", to);
            return Ok(());
        };
        if to.trim().is_empty() {
            tracing::warn!("WhatsApp sem destinatário, ignorando");
            return Ok(());
        }

        let from = whatsapp_address(&twilio.from);
        let to = whatsapp_address(to);
        let form = [("From", from.as_str()), ("To", to.as_str()), ("Body", body)];

        self.http
            .post(format!(
                "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
                twilio.account_sid
            ))
            .basic_auth(&twilio.account_sid, Some(&twilio.auth_token))
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("twilio: {e}")))?;
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
        let Some((mailer, from)) = &self.mailer else {
            tracing::info!("E-mail não configurado, ignorando: {}", subject);
            return Ok(());
        };

        let email = EmailMessage::builder()
            .from(from.parse().map_err(|e| AppError::Upstream(format!("smtp from: {e}")))?)
            .to(to.parse().map_err(|e| AppError::Upstream(format!("smtp to: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| AppError::Upstream(format!("smtp build: {e}")))?;

        mailer
            .send(email)
            .await
            .map_err(|e| AppError::Upstream(format!("smtp: {e}")))?;
        Ok(())
    }
}

/// Notificações internas (tabela `notifications`) e disparos para clientes e equipe.
///
/// Todos os `notify_*` são best effort do ponto de vista de quem chama: a
/// transição de estado já foi gravada antes, e nada aqui desfaz essa gravação.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    transport: Arc<dyn NotificationTransport>,
    staff_whatsapp: Option<String>,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        transport: Arc<dyn NotificationTransport>,
        staff_whatsapp: Option<String>,
    ) -> Self {
        Self { repo, users, transport, staff_whatsapp }
    }

    // --- INBOX ---

    pub async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, AppError> {
        self.repo.list(query, NOTIFICATION_LIST_LIMIT).await
    }

    pub async fn mark_read(&self, id: Uuid, is_read: bool) -> Result<Notification, AppError> {
        self.repo
            .set_read(id, is_read)
            .await?
            .ok_or(AppError::ResourceNotFound("Notification"))
    }

    // --- DISPAROS ---

    async fn whatsapp(&self, to: &str, body: &str) {
        if let Err(e) = self.transport.send_whatsapp(to, body).await {
            tracing::warn!("Falha ao enviar WhatsApp para {}: {}", to, e);
        }
    }

    // Falha ao gravar uma notificação não impede as demais nem os envios
    async fn record(&self, notification: NewNotification) {
        let title = notification.title.clone();
        if let Err(e) = self.repo.create(notification).await {
            tracing::warn!("Falha ao gravar notificação '{}': {}", title, e);
        }
    }

    async fn email(&self, to: &str, subject: &str, html: &str) {
        if let Err(e) = self.transport.send_email(to, subject, html).await {
            tracing::warn!("Falha ao enviar e-mail '{}' para {}: {}", subject, to, e);
        }
    }

    pub async fn notify_new_reservation(&self, detail: &ReservationDetail) -> Result<(), AppError> {
        let r = &detail.reservation;
        let client = &detail.client;

        let guides = self.users.list_by_role(UserRole::Guide).await.unwrap_or_else(|e| {
            tracing::warn!("Falha ao listar guias para a reserva {}: {}", r.id, e);
            Vec::new()
        });
        for guide in &guides {
            self.record(NewNotification {
                notification_type: NotificationType::NewReservation,
                title: "Nueva Reserva".into(),
                message: format!(
                    "Nueva reserva de {} para el tour {}",
                    client.name, detail.tour_title
                ),
                user_id: Some(guide.id),
                client_id: None,
                metadata: Some(json!({ "reservationId": r.id })),
            })
            .await;
        }

        if let Some(staff) = &self.staff_whatsapp {
            let body = format!(
                "🔔 Nueva Reserva\n\nCliente: {}\nTour: {}\nFecha: {}\nParticipantes: {}",
                client.name, detail.tour_title, r.date, r.participants
            );
            self.whatsapp(staff, &body).await;
        }

        let body = format!(
            "✅ Reserva Recibida\n\nHola {},\n\nTu reserva ha sido recibida:\n- Tour: {}\n- Fecha: {}\n- Participantes: {}\n- Total: ${}\n\nTe notificaremos cuando sea confirmada.\n\nGracias por elegirnos!",
            client.name, detail.tour_title, r.date, r.participants, r.total_price
        );
        self.whatsapp(&client.phone, &body).await;

        let html = format!(
            "<h2>Reserva Recibida</h2>\
             <p>Hola {},</p>\
             <p>Tu reserva ha sido recibida:</p>\
             <ul><li>Tour: {}</li><li>Fecha: {}</li><li>Participantes: {}</li><li>Total: ${}</li></ul>\
             <p>Te notificaremos cuando sea confirmada.</p>\
             <p>Gracias por elegirnos!</p>",
            client.name, detail.tour_title, r.date, r.participants, r.total_price
        );
        self.email(&client.email, "Reserva Recibida", &html).await;

        Ok(())
    }

    // Pagamento aprovado: só o primeiro guia é avisado
    pub async fn notify_payment_received(&self, detail: &ReservationDetail) -> Result<(), AppError> {
        let guides = self.users.list_by_role(UserRole::Guide).await?;
        let Some(guide) = guides.first() else {
            tracing::warn!("Pagamento recebido mas nenhum guia cadastrado: {}", detail.reservation.id);
            return Ok(());
        };

        self.record(NewNotification {
            notification_type: NotificationType::PaymentReceived,
            title: "Pago Recibido - Pendiente de Aprobación".into(),
            message: format!(
                "El cliente {} ha pagado la reserva del tour {} ({}). Revisa y aprueba la reserva.",
                detail.client.name, detail.tour_title, detail.reservation.date
            ),
            user_id: Some(guide.id),
            client_id: None,
            metadata: Some(json!({ "reservationId": detail.reservation.id })),
        })
        .await;
        Ok(())
    }

    pub async fn notify_reservation_confirmed(&self, detail: &ReservationDetail) -> Result<(), AppError> {
        let r = &detail.reservation;
        let client = &detail.client;

        self.record(NewNotification {
            notification_type: NotificationType::ReservationConfirmed,
            title: "Reserva Confirmada".into(),
            message: format!("Tu reserva para el tour \"{}\" ha sido confirmada.", detail.tour_title),
            user_id: None,
            client_id: Some(client.id),
            metadata: Some(json!({ "reservationId": r.id, "clientId": client.id })),
        })
        .await;

        let vehicle_line = detail
            .vehicle_name
            .as_ref()
            .map(|name| format!("\n- Vehículo: {name}"))
            .unwrap_or_default();
        let body = format!(
            "🎉 Reserva Confirmada\n\nHola {},\n\nTu reserva ha sido confirmada:\n- Tour: {}\n- Fecha: {}\n- Hora: {}\n- Participantes: {}{}\n\n¡Nos vemos pronto!",
            client.name, detail.tour_title, r.date, r.time, r.participants, vehicle_line
        );
        self.whatsapp(&client.phone, &body).await;

        let vehicle_item = detail
            .vehicle_name
            .as_ref()
            .map(|name| format!("<li>Vehículo: {name}</li>"))
            .unwrap_or_default();
        let html = format!(
            "<h2>Reserva Confirmada</h2>\
             <p>Hola {},</p>\
             <p>Tu reserva ha sido confirmada:</p>\
             <ul><li>Tour: {}</li><li>Fecha: {}</li><li>Hora: {}</li><li>Participantes: {}</li>{}</ul>\
             <p>¡Nos vemos pronto!</p>",
            client.name, detail.tour_title, r.date, r.time, r.participants, vehicle_item
        );
        self.email(&client.email, "Reserva Confirmada", &html).await;

        Ok(())
    }

    pub async fn notify_reservation_rejected(&self, detail: &ReservationDetail, reason: &str) -> Result<(), AppError> {
        let client = &detail.client;
        let message = format!(
            "Tu reserva para el tour \"{}\" ha sido rechazada. Motivo: {}",
            detail.tour_title, reason
        );

        self.record(NewNotification {
            notification_type: NotificationType::ReservationCancelled,
            title: "Reserva Rechazada".into(),
            message: message.clone(),
            user_id: None,
            client_id: Some(client.id),
            metadata: Some(json!({
                "reservationId": detail.reservation.id,
                "clientId": client.id,
            })),
        })
        .await;

        self.whatsapp(&client.phone, &format!("❌ Reserva Rechazada\n\nHola {},\n\n{}", client.name, message))
            .await;
        self.email(
            &client.email,
            "Reserva Rechazada",
            &format!("<h2>Reserva Rechazada</h2><p>Hola {},</p><p>{}</p>", client.name, message),
        )
        .await;

        Ok(())
    }

    pub async fn notify_message_received(&self, message: &Message) -> Result<(), AppError> {
        let preview: String = message.content.chars().take(100).collect();
        let guides = self.users.list_by_role(UserRole::Guide).await?;

        for guide in &guides {
            self.record(NewNotification {
                notification_type: NotificationType::MessageReceived,
                title: format!("Nuevo mensaje de {}", message.channel.as_str()),
                message: format!("{}: {}", message.name, preview),
                user_id: Some(guide.id),
                client_id: message.client_id,
                metadata: Some(json!({ "messageId": message.id })),
            })
            .await;
        }
        Ok(())
    }
}

pub fn rejection_reason(reason: Option<&str>) -> String {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REJECTION_REASON)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reason_uses_default() {
        assert_eq!(rejection_reason(None), "Reserva rechazada por el guía");
        assert_eq!(rejection_reason(Some("   ")), "Reserva rechazada por el guía");
        assert_eq!(rejection_reason(Some("no disponibilidad de guía")), "no disponibilidad de guía");
    }

    #[test]
    fn whatsapp_numbers_get_channel_prefix() {
        assert_eq!(whatsapp_address("+5216141234567"), "whatsapp:+5216141234567");
        assert_eq!(whatsapp_address("whatsapp:+14155238886"), "whatsapp:+14155238886");
    }

    use std::sync::Mutex;

    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::db::{MemoryStore, Repositories};
    use crate::models::reservation::{Client, PaymentStatus, Reservation, ReservationStatus};

    struct BrokenInbox;

    #[async_trait]
    impl NotificationRepository for BrokenInbox {
        async fn create(&self, _: NewNotification) -> Result<Notification, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("inbox offline")))
        }
        async fn list(&self, _: &NotificationQuery, _: i64) -> Result<Vec<Notification>, AppError> {
            Ok(Vec::new())
        }
        async fn set_read(&self, _: Uuid, _: bool) -> Result<Option<Notification>, AppError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<String>>);

    #[async_trait]
    impl NotificationTransport for Outbox {
        async fn send_whatsapp(&self, to: &str, _: &str) -> Result<(), AppError> {
            self.0.lock().unwrap().push(format!("whatsapp:{to}"));
            Ok(())
        }
        async fn send_email(&self, to: &str, subject: &str, _: &str) -> Result<(), AppError> {
            self.0.lock().unwrap().push(format!("email:{to}:{subject}"));
            Ok(())
        }
    }

    fn detail() -> ReservationDetail {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name: "Ana López".into(),
            email: "ana@example.com".into(),
            phone: "+5216141234567".into(),
            country: None,
            created_at: now,
            updated_at: now,
        };
        ReservationDetail {
            reservation: Reservation {
                id: Uuid::new_v4(),
                tour_id: "tour-creel".into(),
                client_id: client.id,
                vehicle_id: None,
                user_id: None,
                date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
                time: "08:00".into(),
                participants: 2,
                total_price: Decimal::from(2400),
                status: ReservationStatus::Pending,
                payment_status: PaymentStatus::Pending,
                payment_method: "MANUAL".into(),
                notes: None,
                created_at: now,
                updated_at: now,
            },
            tour_title: "Creel".into(),
            client,
            vehicle_name: None,
        }
    }

    #[tokio::test]
    async fn inbox_failure_still_reaches_the_client() {
        let repos = Repositories::in_memory(MemoryStore::new());
        repos
            .users
            .create_user("guia@example.com", "Guía", "hash", UserRole::Guide)
            .await
            .unwrap();
        let outbox = Arc::new(Outbox::default());
        let service = NotificationService::new(
            Arc::new(BrokenInbox),
            repos.users.clone(),
            outbox.clone(),
            Some("+5216140000000".into()),
        );

        service.notify_new_reservation(&detail()).await.unwrap();
        service.notify_reservation_rejected(&detail(), "Clima").await.unwrap();

        let sent = outbox.0.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                "whatsapp:+5216140000000".to_string(),
                "whatsapp:+5216141234567".to_string(),
                "email:ana@example.com:Reserva Recibida".to_string(),
                "whatsapp:+5216141234567".to_string(),
                "email:ana@example.com:Reserva Rechazada".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unconfigured_channels_are_skipped() {
        let transport = LiveTransport::new(reqwest::Client::new(), None, None).unwrap();
        transport.send_whatsapp("+5216141234567", "hola").await.unwrap();
        transport.send_email("ana@example.com", "Reserva", "<p>hola</p>").await.unwrap();
    }
}
