// src/db/reservation_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        availability_repo::{release_capacity, reserve_capacity},
        ReservationRepository,
    },
    models::reservation::{
        Client, NewBooking, NewClient, Payment, PaymentSession, PaymentStatus, Reservation,
        ReservationDetail, ReservationStatus,
    },
};

#[derive(Clone)]
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Cliente identificado pelo e-mail. Um cliente já cadastrado é reaproveitado sem alterações;
// o ON CONFLICT resolve a corrida entre duas reservas simultâneas
async fn upsert_client<'e, E>(executor: E, client: &NewClient) -> Result<Client, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (id, name, email, phone, country)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&client.name)
    .bind(client.email.to_lowercase())
    .bind(&client.phone)
    .bind(&client.country)
    .fetch_one(executor)
    .await?;
    Ok(client)
}

async fn find_reservation<'e, E>(executor: E, id: Uuid) -> Result<Option<Reservation>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let reservation = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(reservation)
}

// UPDATE condicional não afetou nada: reserva inexistente ou fora de PENDING
async fn transition_error(conn: &mut PgConnection, id: Uuid, to: ReservationStatus) -> AppError {
    match find_reservation(&mut *conn, id).await {
        Ok(Some(current)) => current
            .status
            .ensure_transition(to)
            .err()
            .unwrap_or(AppError::InvalidStateTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            }),
        Ok(None) => AppError::ReservationNotFound,
        Err(e) => e,
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create_booking(&self, booking: NewBooking) -> Result<(Reservation, Payment), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Vagas (falha aqui desfaz tudo no drop do tx)
        reserve_capacity(&mut *tx, &booking.tour_id, booking.date, booking.participants).await?;

        // 2. Cliente
        let client = upsert_client(&mut *tx, &booking.client).await?;

        // 3. Reserva
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                id, tour_id, client_id, vehicle_id, date, time, participants,
                total_price, status, payment_status, payment_method
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&booking.tour_id)
        .bind(client.id)
        .bind(&booking.vehicle_id)
        .bind(booking.date)
        .bind(&booking.time)
        .bind(booking.participants)
        .bind(booking.total_price)
        .bind(ReservationStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(booking.payment_method.as_str())
        .fetch_one(&mut *tx)
        .await?;

        // 4. Pagamento
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, reservation_id, amount, currency, status, provider)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reservation.id)
        .bind(reservation.total_price)
        .bind(&booking.currency)
        .bind(PaymentStatus::Pending)
        .bind(booking.payment_method.provider())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((reservation, payment))
    }

    async fn attach_payment_session(&self, payment_id: Uuid, session: &PaymentSession) -> Result<Payment, AppError> {
        let metadata = serde_json::to_value(session).map_err(|e| anyhow::anyhow!(e))?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET provider_id = $2, metadata = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(&session.provider_id)
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ResourceNotFound("Payment"))?;
        Ok(payment)
    }

    async fn abort_booking(&self, reservation_id: Uuid, reason: &str) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'CANCELLED', payment_status = 'FAILED', notes = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(reservation_id)
        .bind(reason)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reservation) = cancelled else {
            return Err(transition_error(&mut *tx, reservation_id, ReservationStatus::Cancelled).await);
        };

        release_capacity(&mut *tx, &reservation.tour_id, reservation.date, reservation.participants).await?;

        sqlx::query("UPDATE payments SET status = 'FAILED', updated_at = NOW() WHERE reservation_id = $1")
            .bind(reservation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(reservation)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Reservation>, AppError> {
        find_reservation(&self.pool, id).await
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<ReservationDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let Some(reservation) = find_reservation(&mut *conn, id).await? else {
            return Ok(None);
        };

        let tour_title: Option<String> = sqlx::query_scalar("SELECT title FROM tours WHERE id = $1")
            .bind(&reservation.tour_id)
            .fetch_optional(&mut *conn)
            .await?;

        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(reservation.client_id)
            .fetch_one(&mut *conn)
            .await?;

        let vehicle_name: Option<String> = match &reservation.vehicle_id {
            Some(vehicle_id) => {
                sqlx::query_scalar("SELECT name FROM vehicles WHERE id = $1")
                    .bind(vehicle_id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            None => None,
        };

        Ok(Some(ReservationDetail {
            tour_title: tour_title.unwrap_or_else(|| reservation.tour_id.clone()),
            reservation,
            client,
            vehicle_name,
        }))
    }

    async fn list(&self, status: Option<ReservationStatus>) -> Result<Vec<Reservation>, AppError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE ($1::reservation_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    async fn confirm(&self, id: Uuid, user_id: Uuid, vehicle_id: Option<&str>) -> Result<Reservation, AppError> {
        let mut conn = self.pool.acquire().await?;

        let confirmed = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'CONFIRMED',
                user_id = $2,
                vehicle_id = COALESCE($3, vehicle_id),
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(vehicle_id)
        .fetch_optional(&mut *conn)
        .await?;

        match confirmed {
            Some(reservation) => Ok(reservation),
            None => Err(transition_error(&mut *conn, id, ReservationStatus::Confirmed).await),
        }
    }

    async fn reject(&self, id: Uuid, reason: &str) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await?;

        let rejected = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'CANCELLED', notes = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reservation) = rejected else {
            return Err(transition_error(&mut *tx, id, ReservationStatus::Cancelled).await);
        };

        // Só chega aqui uma vez por reserva: a segunda rejeição não passa do WHERE acima
        release_capacity(&mut *tx, &reservation.tour_id, reservation.date, reservation.participants).await?;

        tx.commit().await?;
        Ok(reservation)
    }

    async fn update_payment_status(
        &self,
        reservation_id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3,
                transaction_id = COALESCE($4, transaction_id),
                updated_at = NOW()
            WHERE reservation_id = $1 AND status = $2
            "#,
        )
        .bind(reservation_id)
        .bind(expected)
        .bind(status)
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<PaymentStatus> =
                sqlx::query_scalar("SELECT status FROM payments WHERE reservation_id = $1")
                    .bind(reservation_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match current {
                Some(current) => AppError::InvalidStateTransition {
                    from: current.to_string(),
                    to: status.to_string(),
                },
                None => AppError::ReservationNotFound,
            });
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET payment_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reservation_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reservation)
    }
}
