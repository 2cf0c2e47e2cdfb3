// src/db/notification_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NotificationRepository,
    models::notification::{NewNotification, Notification, NotificationQuery},
};

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, client_id, notification_type, title, message, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.client_id)
        .bind(notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list(&self, query: &NotificationQuery, limit: i64) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::boolean IS NULL OR is_read = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(query.user_id)
        .bind(query.client_id)
        .bind(query.is_read)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_read)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }
}
