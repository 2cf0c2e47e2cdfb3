// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewReservation,
    PaymentReceived,
    ReservationConfirmed,
    ReservationCancelled,
    MessageReceived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// Registro a ser criado; destinatário é um membro da equipe ou um cliente
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub user_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

impl NewNotification {
    pub fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            client_id: self.client_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            metadata: self.metadata,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    pub user_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub is_read: Option<bool>,
}
