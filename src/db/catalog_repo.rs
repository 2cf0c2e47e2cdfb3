// src/db/catalog_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::is_unique_violation, error::AppError},
    db::CatalogRepository,
    models::tour::{Tour, UpdateTourPayload, Vehicle},
};

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_TOUR: &str = r#"
    INSERT INTO tours (
        id, title, description, price, duration, max_capacity, difficulty,
        image, images, itinerary, includes, excludes, requirements,
        schedules, languages, policies, is_active
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
    RETURNING *
"#;

const UPDATE_TOUR: &str = r#"
    UPDATE tours SET
        title = $2,
        description = $3,
        price = $4,
        duration = $5,
        max_capacity = $6,
        difficulty = $7,
        image = $8,
        images = $9,
        itinerary = $10,
        includes = $11,
        excludes = $12,
        requirements = $13,
        schedules = $14,
        languages = $15,
        policies = $16,
        is_active = $17,
        updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

// Mesmo bind para INSERT e UPDATE ($1 = id)
async fn write_tour<'e, E>(executor: E, sql: &'static str, tour: &Tour) -> Result<Tour, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Tour>(sql)
        .bind(&tour.id)
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(tour.price)
        .bind(tour.duration)
        .bind(tour.max_capacity)
        .bind(&tour.difficulty)
        .bind(&tour.image)
        .bind(&tour.images)
        .bind(&tour.itinerary)
        .bind(&tour.includes)
        .bind(&tour.excludes)
        .bind(&tour.requirements)
        .bind(&tour.schedules)
        .bind(&tour.languages)
        .bind(&tour.policies)
        .bind(tour.is_active)
        .fetch_one(executor)
        .await
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_active_tours(&self) -> Result<Vec<Tour>, AppError> {
        let tours = sqlx::query_as::<_, Tour>(
            "SELECT * FROM tours WHERE is_active ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tours)
    }

    async fn find_tour(&self, id: &str) -> Result<Option<Tour>, AppError> {
        let tour = sqlx::query_as::<_, Tour>("SELECT * FROM tours WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tour)
    }

    async fn create_tour(&self, tour: Tour) -> Result<Tour, AppError> {
        write_tour(&self.pool, INSERT_TOUR, &tour).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::BadRequest(format!("Tour '{}' already exists", tour.id))
            } else {
                AppError::DatabaseError(e)
            }
        })
    }

    async fn update_tour(&self, id: &str, changes: UpdateTourPayload) -> Result<Option<Tour>, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Tour>("SELECT * FROM tours WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(mut tour) = current else {
            return Ok(None);
        };

        tour.apply_changes(changes);
        let updated = write_tour(&mut *tx, UPDATE_TOUR, &tour).await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn deactivate_tour(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tours SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_active_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE is_active ORDER BY capacity DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn find_vehicle(&self, id: &str) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn create_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, AppError> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, name, vehicle_type, capacity, description, images, amenities, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&vehicle.id)
        .bind(&vehicle.name)
        .bind(&vehicle.vehicle_type)
        .bind(vehicle.capacity)
        .bind(&vehicle.description)
        .bind(&vehicle.images)
        .bind(&vehicle.amenities)
        .bind(vehicle.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::BadRequest(format!("Vehicle '{}' already exists", vehicle.id))
            } else {
                AppError::DatabaseError(e)
            }
        })
    }
}
