// src/services/catalog_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, CatalogRepository},
    models::{
        availability::AvailabilityQuery,
        tour::{
            slugify, CreateTourPayload, CreateVehiclePayload, SiteStats, Tour, TourDetail,
            UpdateTourPayload, Vehicle,
        },
    },
};

const CATALOG_JSON: &str = include_str!("../../data/catalog.json");

// Catálogo embutido no binário. Só é usado nas leituras públicas quando o
// banco falha ou ainda está vazio; nunca em escrita.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticCatalog {
    pub tours: Vec<Tour>,
    pub vehicles: Vec<Vehicle>,
    pub stats: SiteStats,
}

impl StaticCatalog {
    pub fn load() -> Result<Self, AppError> {
        serde_json::from_str(CATALOG_JSON)
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("catálogo embutido inválido: {e}")))
    }

    pub fn tour(&self, id: &str) -> Option<&Tour> {
        self.tours.iter().find(|t| t.id == id)
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    fallback: Arc<StaticCatalog>,
    featured_tour_id: Option<String>,
}

impl CatalogService {
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        fallback: Arc<StaticCatalog>,
        featured_tour_id: Option<String>,
    ) -> Self {
        Self { repo, availability, fallback, featured_tour_id }
    }

    // --- LEITURAS PÚBLICAS (com fallback) ---

    pub async fn list_tours(&self) -> Vec<Tour> {
        let mut tours = match self.repo.list_active_tours().await {
            Ok(tours) => tours,
            Err(e) => {
                tracing::warn!("Falha ao listar tours, usando catálogo padrão: {}", e);
                self.fallback.tours.clone()
            }
        };

        // Tour em destaque sempre primeiro; o resto mantém a ordem
        if let Some(featured) = &self.featured_tour_id {
            if let Some(pos) = tours.iter().position(|t| &t.id == featured) {
                let tour = tours.remove(pos);
                tours.insert(0, tour);
            }
        }
        tours
    }

    pub async fn get_tour(&self, id: &str) -> Result<TourDetail, AppError> {
        match self.repo.find_tour(id).await {
            Ok(Some(tour)) => {
                let query = AvailabilityQuery {
                    tour_id: Some(tour.id.clone()),
                    start_date: Some(Utc::now().date_naive()),
                    end_date: None,
                };
                let availability = match self.availability.list(&query).await {
                    Ok(slots) => slots.into_iter().filter(|s| s.available).collect(),
                    Err(e) => {
                        tracing::warn!("Falha ao carregar datas do tour {}: {}", id, e);
                        Vec::new()
                    }
                };
                Ok(TourDetail { tour, availability })
            }
            Ok(None) => self.fallback_tour(id).ok_or(AppError::TourNotFound),
            Err(e) => {
                tracing::warn!("Falha ao buscar tour {}, tentando catálogo padrão: {}", id, e);
                self.fallback_tour(id).ok_or(e)
            }
        }
    }

    fn fallback_tour(&self, id: &str) -> Option<TourDetail> {
        self.fallback.tour(id).map(|tour| TourDetail {
            tour: tour.clone(),
            availability: Vec::new(),
        })
    }

    pub async fn list_vehicles(&self) -> Vec<Vehicle> {
        match self.repo.list_active_vehicles().await {
            Ok(vehicles) if !vehicles.is_empty() => vehicles,
            Ok(_) => self.fallback.vehicles.clone(),
            Err(e) => {
                tracing::warn!("Falha ao listar veículos, usando frota padrão: {}", e);
                self.fallback.vehicles.clone()
            }
        }
    }

    pub fn stats(&self) -> SiteStats {
        self.fallback.stats.clone()
    }

    // --- LEITURAS ESTRITAS (usadas por reservas) ---

    pub async fn find_active_tour(&self, id: &str) -> Result<Tour, AppError> {
        self.repo
            .find_tour(id)
            .await?
            .filter(|t| t.is_active)
            .ok_or(AppError::TourNotFound)
    }

    pub async fn find_vehicle(&self, id: &str) -> Result<Vehicle, AppError> {
        self.repo.find_vehicle(id).await?.ok_or(AppError::VehicleNotFound)
    }

    // --- ESCRITA ---

    pub async fn create_tour(&self, payload: CreateTourPayload) -> Result<Tour, AppError> {
        let id = payload
            .id
            .clone()
            .unwrap_or_else(|| slugify("tour-", &payload.title));
        let tour = self.repo.create_tour(Tour::from_payload(id, payload)).await?;
        tracing::info!("Tour criado: {}", tour.id);
        Ok(tour)
    }

    pub async fn update_tour(&self, id: &str, payload: UpdateTourPayload) -> Result<Tour, AppError> {
        self.repo.update_tour(id, payload).await?.ok_or(AppError::TourNotFound)
    }

    pub async fn deactivate_tour(&self, id: &str) -> Result<(), AppError> {
        if !self.repo.deactivate_tour(id).await? {
            return Err(AppError::TourNotFound);
        }
        tracing::info!("Tour desativado: {}", id);
        Ok(())
    }

    pub async fn create_vehicle(&self, payload: CreateVehiclePayload) -> Result<Vehicle, AppError> {
        let id = payload
            .id
            .clone()
            .unwrap_or_else(|| slugify("vehicle-", &payload.name));
        self.repo.create_vehicle(Vehicle::from_payload(id, payload)).await
    }

    /// Grava o catálogo padrão no banco. Registros já existentes (mesmo
    /// desativados) não são tocados.
    pub async fn seed_defaults(&self) -> Result<usize, AppError> {
        let mut created = 0;
        for tour in &self.fallback.tours {
            if self.repo.find_tour(&tour.id).await?.is_none() {
                self.repo.create_tour(tour.clone()).await?;
                created += 1;
            }
        }
        for vehicle in &self.fallback.vehicles {
            if self.repo.find_vehicle(&vehicle.id).await?.is_none() {
                self.repo.create_vehicle(vehicle.clone()).await?;
                created += 1;
            }
        }
        Ok(created)
    }
}
