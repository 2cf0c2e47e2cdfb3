// src/services/message_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{MessageRepository, UserRepository},
    models::message::{CreateMessagePayload, Message, MessageQuery},
    services::notification_service::NotificationService,
};

// Caixa de entrada multicanal (WhatsApp, e-mail, formulário, telefone, redes)
#[derive(Clone)]
pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationService,
}

impl MessageService {
    pub fn new(
        repo: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self { repo, users, notifications }
    }

    pub async fn create(&self, payload: CreateMessagePayload) -> Result<Message, AppError> {
        payload.validate()?;

        // Vincula ao cliente já conhecido pelo e-mail
        let client_id = match payload.email.as_deref() {
            Some(email) => self.users.find_client_by_email(email).await?.map(|c| c.id),
            None => None,
        };

        let message = self.repo.create(&payload, client_id).await?;
        tracing::info!("Mensagem recebida via {}: {}", message.channel.as_str(), message.id);

        if let Err(e) = self.notifications.notify_message_received(&message).await {
            tracing::warn!("Falha ao notificar mensagem {}: {}", message.id, e);
        }
        Ok(message)
    }

    pub async fn list(&self, query: &MessageQuery) -> Result<Vec<Message>, AppError> {
        self.repo.list(query).await
    }

    pub async fn mark_read(&self, id: Uuid, is_read: bool) -> Result<Message, AppError> {
        self.repo
            .set_read(id, is_read)
            .await?
            .ok_or(AppError::ResourceNotFound("Message"))
    }
}
