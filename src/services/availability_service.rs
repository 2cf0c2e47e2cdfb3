// src/services/availability_service.rs

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, CatalogRepository},
    models::availability::{AvailabilityQuery, SetAvailabilityPayload, TourAvailability},
};

/// Vagas por (tour, data). Invariante: `0 <= booked <= capacity`.
#[derive(Clone)]
pub struct AvailabilityLedger {
    repo: Arc<dyn AvailabilityRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl AvailabilityLedger {
    pub fn new(repo: Arc<dyn AvailabilityRepository>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { repo, catalog }
    }

    /// `None` significa data não configurada, tratada como indisponível.
    pub async fn get_or_default(&self, tour_id: &str, date: NaiveDate) -> Result<Option<TourAvailability>, AppError> {
        self.repo.find(tour_id, date).await
    }

    pub async fn list(&self, query: &AvailabilityQuery) -> Result<Vec<TourAvailability>, AppError> {
        self.repo.list(query).await
    }

    pub async fn reserve(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<TourAvailability, AppError> {
        if participants < 1 {
            return Err(AppError::BadRequest("participants must be at least 1".into()));
        }
        let slot = self.repo.reserve(tour_id, date, participants).await?;
        tracing::debug!(tour_id, %date, booked = slot.booked, capacity = slot.capacity, "Vagas reservadas");
        Ok(slot)
    }

    pub async fn release(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<Option<TourAvailability>, AppError> {
        let slot = self.repo.release(tour_id, date, participants).await?;
        if slot.is_none() {
            tracing::warn!(tour_id, %date, "Liberação de vagas para data sem registro");
        }
        Ok(slot)
    }

    /// Upsert por data. A capacidade padrão de uma data nova é o máximo do tour.
    pub async fn set_availability(&self, payload: &SetAvailabilityPayload) -> Result<Vec<TourAvailability>, AppError> {
        let tour = self
            .catalog
            .find_tour(&payload.tour_id)
            .await?
            .ok_or(AppError::TourNotFound)?;

        let mut slots = Vec::with_capacity(payload.dates.len());
        for date in &payload.dates {
            let slot = self
                .repo
                .upsert(&tour.id, *date, tour.max_capacity, payload.capacity, payload.available)
                .await?;
            slots.push(slot);
        }

        tracing::info!("Disponibilidade atualizada: {} ({} datas)", tour.id, slots.len());
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::catalog_service::StaticCatalog;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
    }

    async fn ledger() -> AvailabilityLedger {
        let store = MemoryStore::new();
        let catalog = StaticCatalog::load().unwrap();
        store.seed_catalog(catalog.tours, catalog.vehicles).await;
        AvailabilityLedger::new(Arc::new(store.clone()), Arc::new(store))
    }

    fn payload(tour_id: &str, dates: Vec<NaiveDate>, capacity: Option<i32>, available: Option<bool>) -> SetAvailabilityPayload {
        SetAvailabilityPayload {
            tour_id: tour_id.into(),
            dates,
            capacity,
            available,
        }
    }

    #[tokio::test]
    async fn missing_date_is_unavailable() {
        let ledger = ledger().await;
        assert!(ledger.get_or_default("tour-creel", date(1)).await.unwrap().is_none());
        assert!(matches!(
            ledger.reserve("tour-creel", date(1), 1).await,
            Err(AppError::DateUnavailable)
        ));
    }

    #[tokio::test]
    async fn new_dates_default_to_tour_max_capacity() {
        let ledger = ledger().await;
        let slots = ledger
            .set_availability(&payload("tour-basaseachi", vec![date(20), date(21)], None, None))
            .await
            .unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.capacity == 18 && s.booked == 0 && s.available));
    }

    #[tokio::test]
    async fn set_availability_never_resets_booked() {
        let ledger = ledger().await;
        ledger
            .set_availability(&payload("tour-basaseachi", vec![date(20)], Some(18), None))
            .await
            .unwrap();
        ledger.reserve("tour-basaseachi", date(20), 5).await.unwrap();

        let slots = ledger
            .set_availability(&payload("tour-basaseachi", vec![date(20)], Some(20), Some(true)))
            .await
            .unwrap();
        assert_eq!(slots[0].booked, 5);
        assert_eq!(slots[0].capacity, 20);

        let err = ledger
            .set_availability(&payload("tour-basaseachi", vec![date(20)], Some(4), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityBelowBooked { .. }));
    }

    #[tokio::test]
    async fn manually_closed_date_rejects_bookings() {
        let ledger = ledger().await;
        ledger
            .set_availability(&payload("tour-creel", vec![date(3)], Some(10), Some(false)))
            .await
            .unwrap();
        assert!(matches!(
            ledger.reserve("tour-creel", date(3), 1).await,
            Err(AppError::DateUnavailable)
        ));
    }

    #[tokio::test]
    async fn unknown_tour_cannot_be_opened() {
        let ledger = ledger().await;
        let err = ledger
            .set_availability(&payload("tour-nowhere", vec![date(3)], None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TourNotFound));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reserves_never_overbook() {
        let ledger = ledger().await;
        ledger
            .set_availability(&payload("tour-batopilas", vec![date(10)], Some(18), None))
            .await
            .unwrap();

        // 12 pedidos de 3 = 36 vagas disputando 18
        let mut handles = Vec::new();
        for _ in 0..12 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.reserve("tour-batopilas", date(10), 3).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(AppError::NotEnoughCapacity) | Err(AppError::DateUnavailable) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        let slot = ledger.get_or_default("tour-batopilas", date(10)).await.unwrap().unwrap();
        assert_eq!(accepted, 6);
        assert_eq!(slot.booked, 18);
        assert!(slot.booked <= slot.capacity);
        assert!(!slot.available);
    }

    #[tokio::test]
    async fn reserve_then_release_restores_booked() {
        let ledger = ledger().await;
        ledger
            .set_availability(&payload("tour-recowata", vec![date(5)], Some(15), None))
            .await
            .unwrap();
        ledger.reserve("tour-recowata", date(5), 4).await.unwrap();
        ledger.reserve("tour-recowata", date(5), 7).await.unwrap();
        ledger.release("tour-recowata", date(5), 7).await.unwrap();

        let slot = ledger.get_or_default("tour-recowata", date(5)).await.unwrap().unwrap();
        assert_eq!(slot.booked, 4);
    }
}
