// src/db/availability_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AvailabilityRepository,
    models::availability::{AvailabilityQuery, TourAvailability},
};

#[derive(Clone)]
pub struct PgAvailabilityRepository {
    pool: PgPool,
}

impl PgAvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---
// Funções compartilhadas com o repositório de reservas (rodam dentro da transação dele)
// ---

pub(crate) async fn find_slot<'e, E>(
    executor: E,
    tour_id: &str,
    date: NaiveDate,
) -> Result<Option<TourAvailability>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let slot = sqlx::query_as::<_, TourAvailability>(
        "SELECT * FROM tour_availability WHERE tour_id = $1 AND date = $2",
    )
    .bind(tour_id)
    .bind(date)
    .fetch_optional(executor)
    .await?;
    Ok(slot)
}

/// Incrementa `booked` num único UPDATE condicional.
///
/// Se nenhuma linha for afetada, relê o registro só para escolher o erro:
/// data ausente/fechada vira `DateUnavailable`, data aberta porém cheia vira
/// `NotEnoughCapacity`.
pub(crate) async fn reserve_capacity(
    conn: &mut PgConnection,
    tour_id: &str,
    date: NaiveDate,
    participants: i32,
) -> Result<TourAvailability, AppError> {
    let updated = sqlx::query_as::<_, TourAvailability>(
        r#"
        UPDATE tour_availability
        SET booked = booked + $3,
            available = (booked + $3) < capacity,
            updated_at = NOW()
        WHERE tour_id = $1
          AND date = $2
          AND available
          AND booked + $3 <= capacity
        RETURNING *
        "#,
    )
    .bind(tour_id)
    .bind(date)
    .bind(participants)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(slot) = updated {
        return Ok(slot);
    }

    match find_slot(&mut *conn, tour_id, date).await? {
        Some(slot) if slot.available => Err(AppError::NotEnoughCapacity),
        _ => Err(AppError::DateUnavailable),
    }
}

pub(crate) async fn release_capacity<'e, E>(
    executor: E,
    tour_id: &str,
    date: NaiveDate,
    participants: i32,
) -> Result<Option<TourAvailability>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let slot = sqlx::query_as::<_, TourAvailability>(
        r#"
        UPDATE tour_availability
        SET booked = GREATEST(booked - $3, 0),
            available = TRUE,
            updated_at = NOW()
        WHERE tour_id = $1 AND date = $2
        RETURNING *
        "#,
    )
    .bind(tour_id)
    .bind(date)
    .bind(participants)
    .fetch_optional(executor)
    .await?;
    Ok(slot)
}

#[async_trait]
impl AvailabilityRepository for PgAvailabilityRepository {
    async fn find(&self, tour_id: &str, date: NaiveDate) -> Result<Option<TourAvailability>, AppError> {
        find_slot(&self.pool, tour_id, date).await
    }

    async fn list(&self, query: &AvailabilityQuery) -> Result<Vec<TourAvailability>, AppError> {
        let slots = sqlx::query_as::<_, TourAvailability>(
            r#"
            SELECT * FROM tour_availability
            WHERE ($1::text IS NULL OR tour_id = $1)
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date ASC
            "#,
        )
        .bind(query.tour_id.as_deref())
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }

    async fn upsert(
        &self,
        tour_id: &str,
        date: NaiveDate,
        default_capacity: i32,
        capacity: Option<i32>,
        available: Option<bool>,
    ) -> Result<TourAvailability, AppError> {
        let mut tx = self.pool.begin().await?;

        // Garante que a linha existe; concorrentes caem no ON CONFLICT
        sqlx::query(
            r#"
            INSERT INTO tour_availability (id, tour_id, date, capacity, booked, available)
            VALUES ($1, $2, $3, $4, 0, $5)
            ON CONFLICT (tour_id, date) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tour_id)
        .bind(date)
        .bind(capacity.unwrap_or(default_capacity))
        .bind(available.unwrap_or(true))
        .execute(&mut *tx)
        .await?;

        let mut slot = sqlx::query_as::<_, TourAvailability>(
            "SELECT * FROM tour_availability WHERE tour_id = $1 AND date = $2 FOR UPDATE",
        )
        .bind(tour_id)
        .bind(date)
        .fetch_one(&mut *tx)
        .await?;

        slot.reconfigure(capacity, available)?;

        let slot = sqlx::query_as::<_, TourAvailability>(
            r#"
            UPDATE tour_availability
            SET capacity = $2, available = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(slot.id)
        .bind(slot.capacity)
        .bind(slot.available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(slot)
    }

    async fn reserve(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<TourAvailability, AppError> {
        let mut conn = self.pool.acquire().await?;
        reserve_capacity(&mut *conn, tour_id, date, participants).await
    }

    async fn release(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<Option<TourAvailability>, AppError> {
        release_capacity(&self.pool, tour_id, date, participants).await
    }
}
