// src/db/message_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::MessageRepository,
    models::message::{CreateMessagePayload, Message, MessageQuery},
};

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, payload: &CreateMessagePayload, client_id: Option<Uuid>) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, client_id, name, email, phone, channel, subject, content)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.channel)
        .bind(&payload.subject)
        .bind(&payload.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list(&self, query: &MessageQuery) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE ($1::boolean IS NULL OR is_read = $1)
              AND ($2::message_channel IS NULL OR channel = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.is_read)
        .bind(query.channel)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>(
            "UPDATE messages SET is_read = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_read)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }
}
