// src/models/availability.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// Capacidade de um tour numa data. Ausência de registro = data fechada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourAvailability {
    pub id: Uuid,
    pub tour_id: String,
    pub date: NaiveDate,
    pub capacity: i32,
    pub booked: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TourAvailability {
    pub fn new(tour_id: &str, date: NaiveDate, capacity: i32, available: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tour_id: tour_id.to_string(),
            date,
            capacity,
            booked: 0,
            available: available && capacity > 0,
            created_at: now,
            updated_at: now,
        }
    }

    // Checagem e incremento juntos; quem chama deve segurar o lock do registro.
    pub fn reserve(&mut self, participants: i32) -> Result<(), AppError> {
        if !self.available {
            return Err(AppError::DateUnavailable);
        }
        if self.booked + participants > self.capacity {
            return Err(AppError::NotEnoughCapacity);
        }
        self.booked += participants;
        self.available = self.booked < self.capacity;
        self.updated_at = Utc::now();
        Ok(())
    }

    // Devolve vagas. Reabre a data mesmo se tiver sido fechada manualmente.
    pub fn release(&mut self, participants: i32) {
        self.booked = (self.booked - participants).max(0);
        self.available = true;
        self.updated_at = Utc::now();
    }

    pub fn reconfigure(&mut self, capacity: Option<i32>, available: Option<bool>) -> Result<(), AppError> {
        if let Some(capacity) = capacity {
            if capacity < self.booked {
                return Err(AppError::CapacityBelowBooked {
                    capacity,
                    booked: self.booked,
                });
            }
            self.capacity = capacity;
        }
        let requested = available.unwrap_or(self.available);
        self.available = requested && self.booked < self.capacity;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub tour_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AvailabilityQuery {
    pub fn matches(&self, record: &TourAvailability) -> bool {
        self.tour_id.as_deref().is_none_or(|id| record.tour_id == id)
            && self.start_date.is_none_or(|start| record.date >= start)
            && self.end_date.is_none_or(|end| record.date <= end)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAvailabilityPayload {
    #[validate(length(min = 1, message = "tourId is required."))]
    pub tour_id: String,

    #[validate(length(min = 1, message = "At least one date is required."))]
    pub dates: Vec<NaiveDate>,

    #[validate(range(min = 1, message = "Capacity must be at least 1."))]
    pub capacity: Option<i32>,

    pub available: Option<bool>,
}
