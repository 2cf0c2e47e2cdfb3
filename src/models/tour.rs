// src/models/tour.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::availability::TourAvailability;

fn default_active() -> bool {
    true
}

// --- TOURS ---
// O `id` é um slug legível (ex: "tour-basaseachi"), não um UUID.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: String,
    pub title: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    /// Duração em horas
    pub duration: i32,
    pub max_capacity: i32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub schedules: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub policies: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

// Tour com as próximas datas abertas, usado na página de detalhe
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourDetail {
    #[serde(flatten)]
    pub tour: Tour,
    pub availability: Vec<TourAvailability>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourPayload {
    #[validate(length(min = 1, message = "Tour id is required."))]
    pub id: Option<String>,

    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[schema(value_type = f64)]
    pub price: Decimal,

    #[validate(range(min = 1, message = "Duration must be at least one hour."))]
    pub duration: i32,

    #[validate(range(min = 1, message = "Max capacity must be at least 1."))]
    pub max_capacity: i32,

    pub difficulty: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub schedules: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub policies: Option<String>,
}

// Atualização parcial: só os campos presentes são alterados.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourPayload {
    #[validate(length(min = 1, message = "Title cannot be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 1, message = "Duration must be at least one hour."))]
    pub duration: Option<i32>,
    #[validate(range(min = 1, message = "Max capacity must be at least 1."))]
    pub max_capacity: Option<i32>,
    pub difficulty: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub itinerary: Option<Vec<String>>,
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub schedules: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub policies: Option<String>,
    pub is_active: Option<bool>,
}

impl Tour {
    pub fn from_payload(id: String, payload: CreateTourPayload) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: payload.title,
            description: payload.description,
            price: payload.price,
            duration: payload.duration,
            max_capacity: payload.max_capacity,
            difficulty: payload.difficulty,
            image: payload.image,
            images: payload.images,
            itinerary: payload.itinerary,
            includes: payload.includes,
            excludes: payload.excludes,
            requirements: payload.requirements,
            schedules: payload.schedules,
            languages: payload.languages,
            policies: payload.policies,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_changes(&mut self, changes: UpdateTourPayload) {
        if let Some(v) = changes.title { self.title = v; }
        if let Some(v) = changes.description { self.description = v; }
        if let Some(v) = changes.price { self.price = v; }
        if let Some(v) = changes.duration { self.duration = v; }
        if let Some(v) = changes.max_capacity { self.max_capacity = v; }
        if let Some(v) = changes.difficulty { self.difficulty = Some(v); }
        if let Some(v) = changes.image { self.image = Some(v); }
        if let Some(v) = changes.images { self.images = v; }
        if let Some(v) = changes.itinerary { self.itinerary = v; }
        if let Some(v) = changes.includes { self.includes = v; }
        if let Some(v) = changes.excludes { self.excludes = v; }
        if let Some(v) = changes.requirements { self.requirements = v; }
        if let Some(v) = changes.schedules { self.schedules = v; }
        if let Some(v) = changes.languages { self.languages = v; }
        if let Some(v) = changes.policies { self.policies = Some(v); }
        if let Some(v) = changes.is_active { self.is_active = v; }
        self.updated_at = Utc::now();
    }
}

// --- VEÍCULOS ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehiclePayload {
    #[validate(length(min = 1, message = "Vehicle id is required."))]
    pub id: Option<String>,

    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Vehicle type is required."))]
    pub vehicle_type: String,

    #[validate(range(min = 1, message = "Capacity must be at least 1."))]
    pub capacity: i32,

    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Vehicle {
    pub fn from_payload(id: String, payload: CreateVehiclePayload) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: payload.name,
            vehicle_type: payload.vehicle_type,
            capacity: payload.capacity,
            description: payload.description,
            images: payload.images,
            amenities: payload.amenities,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// --- ESTATÍSTICAS DO SITE ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub tours_completed: u32,
    pub happy_clients: u32,
    pub years_experience: u32,
}

// Gera um slug a partir do título quando o cliente não informa o id
pub fn slugify(prefix: &str, title: &str) -> String {
    let mut slug = String::with_capacity(title.len() + prefix.len() + 1);
    slug.push_str(prefix);
    let mut last_dash = prefix.ends_with('-');

    for c in title.chars() {
        let mapped = match c {
            'á' | 'à' | 'ä' | 'â' | 'Á' => 'a',
            'é' | 'è' | 'ë' | 'ê' | 'É' => 'e',
            'í' | 'ì' | 'ï' | 'î' | 'Í' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' => 'o',
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' => 'u',
            'ñ' | 'Ñ' => 'n',
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => '-',
        };
        if mapped == '-' {
            if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        } else {
            slug.push(mapped);
            last_dash = false;
        }
    }

    slug.trim_end_matches('-').to_string()
}
