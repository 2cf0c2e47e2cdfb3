// src/models/message.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "message_channel", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageChannel {
    Whatsapp,
    Email,
    Form,
    Phone,
    Social,
}

impl MessageChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageChannel::Whatsapp => "WHATSAPP",
            MessageChannel::Email => "EMAIL",
            MessageChannel::Form => "FORM",
            MessageChannel::Phone => "PHONE",
            MessageChannel::Social => "SOCIAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub channel: MessageChannel,
    pub subject: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessagePayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,

    #[validate(email(message = "The email is invalid."))]
    pub email: Option<String>,

    pub phone: Option<String>,

    pub channel: MessageChannel,

    pub subject: Option<String>,

    #[validate(length(min = 1, message = "Message content is required."))]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    pub is_read: Option<bool>,
    pub channel: Option<MessageChannel>,
}

// Usado por mensagens e notificações
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadPayload {
    pub id: Uuid,
    pub is_read: bool,
}
