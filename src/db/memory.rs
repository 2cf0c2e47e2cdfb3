// src/db/memory.rs
//
// Implementação em memória de todos os repositórios. Usada quando DATABASE_URL
// não está definida (desenvolvimento local) e nos testes. Um único RwLock
// protege o estado inteiro, então cada operação composta é atômica.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        AvailabilityRepository, CatalogRepository, MessageRepository, NotificationRepository,
        ReservationRepository, UserRepository,
    },
    models::{
        auth::{User, UserRole},
        availability::{AvailabilityQuery, TourAvailability},
        message::{CreateMessagePayload, Message, MessageQuery},
        notification::{NewNotification, Notification, NotificationQuery},
        reservation::{
            Client, NewBooking, NewClient, Payment, PaymentSession, PaymentStatus, Reservation,
            ReservationDetail, ReservationStatus,
        },
        tour::{Tour, UpdateTourPayload, Vehicle},
    },
};

#[derive(Default)]
struct MemoryState {
    tours: HashMap<String, Tour>,
    vehicles: HashMap<String, Vehicle>,
    availability: HashMap<(String, NaiveDate), TourAvailability>,
    clients: HashMap<Uuid, Client>,
    reservations: HashMap<Uuid, Reservation>,
    // chave: reservation_id (1:1)
    payments: HashMap<Uuid, Payment>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    users: HashMap<Uuid, User>,
}

impl MemoryState {
    fn upsert_client(&mut self, new_client: &NewClient) -> Client {
        let email = new_client.email.to_lowercase();
        let now = Utc::now();

        if let Some(existing) = self.clients.values_mut().find(|c| c.email == email) {
            existing.updated_at = now;
            return existing.clone();
        }

        let client = Client {
            id: Uuid::new_v4(),
            name: new_client.name.clone(),
            email,
            phone: new_client.phone.clone(),
            country: new_client.country.clone(),
            created_at: now,
            updated_at: now,
        };
        self.clients.insert(client.id, client.clone());
        client
    }

    fn release(&mut self, tour_id: &str, date: NaiveDate, participants: i32) -> Option<TourAvailability> {
        let slot = self.availability.get_mut(&(tour_id.to_string(), date))?;
        slot.release(participants);
        Some(slot.clone())
    }

    fn pending_reservation(&mut self, id: Uuid, to: ReservationStatus) -> Result<&mut Reservation, AppError> {
        let reservation = self.reservations.get_mut(&id).ok_or(AppError::ReservationNotFound)?;
        reservation.status.ensure_transition(to)?;
        Ok(reservation)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_catalog(&self, tours: Vec<Tour>, vehicles: Vec<Vehicle>) {
        let mut state = self.state.write().await;
        for tour in tours {
            state.tours.insert(tour.id.clone(), tour);
        }
        for vehicle in vehicles {
            state.vehicles.insert(vehicle.id.clone(), vehicle);
        }
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_active_tours(&self) -> Result<Vec<Tour>, AppError> {
        let state = self.state.read().await;
        let mut tours: Vec<Tour> = state.tours.values().filter(|t| t.is_active).cloned().collect();
        tours.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tours)
    }

    async fn find_tour(&self, id: &str) -> Result<Option<Tour>, AppError> {
        Ok(self.state.read().await.tours.get(id).cloned())
    }

    async fn create_tour(&self, tour: Tour) -> Result<Tour, AppError> {
        let mut state = self.state.write().await;
        if state.tours.contains_key(&tour.id) {
            return Err(AppError::BadRequest(format!("Tour '{}' already exists", tour.id)));
        }
        state.tours.insert(tour.id.clone(), tour.clone());
        Ok(tour)
    }

    async fn update_tour(&self, id: &str, changes: UpdateTourPayload) -> Result<Option<Tour>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.tours.get_mut(id).map(|tour| {
            tour.apply_changes(changes);
            tour.clone()
        }))
    }

    async fn deactivate_tour(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.tours.get_mut(id) {
            Some(tour) => {
                tour.is_active = false;
                tour.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let state = self.state.read().await;
        let mut vehicles: Vec<Vehicle> = state.vehicles.values().filter(|v| v.is_active).cloned().collect();
        vehicles.sort_by(|a, b| b.capacity.cmp(&a.capacity).then_with(|| a.name.cmp(&b.name)));
        Ok(vehicles)
    }

    async fn find_vehicle(&self, id: &str) -> Result<Option<Vehicle>, AppError> {
        Ok(self.state.read().await.vehicles.get(id).cloned())
    }

    async fn create_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, AppError> {
        let mut state = self.state.write().await;
        if state.vehicles.contains_key(&vehicle.id) {
            return Err(AppError::BadRequest(format!("Vehicle '{}' already exists", vehicle.id)));
        }
        state.vehicles.insert(vehicle.id.clone(), vehicle.clone());
        Ok(vehicle)
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn find(&self, tour_id: &str, date: NaiveDate) -> Result<Option<TourAvailability>, AppError> {
        let state = self.state.read().await;
        Ok(state.availability.get(&(tour_id.to_string(), date)).cloned())
    }

    async fn list(&self, query: &AvailabilityQuery) -> Result<Vec<TourAvailability>, AppError> {
        let state = self.state.read().await;
        let mut slots: Vec<TourAvailability> = state
            .availability
            .values()
            .filter(|slot| query.matches(slot))
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.tour_id.cmp(&b.tour_id)));
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
        let mut state = self.state.write().await;
        let key = (tour_id.to_string(), date);

        match state.availability.get_mut(&key) {
            Some(slot) => {
                slot.reconfigure(capacity, available)?;
                Ok(slot.clone())
            }
            None => {
                let slot = TourAvailability::new(
                    tour_id,
                    date,
                    capacity.unwrap_or(default_capacity),
                    available.unwrap_or(true),
                );
                state.availability.insert(key, slot.clone());
                Ok(slot)
            }
        }
    }

    async fn reserve(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<TourAvailability, AppError> {
        let mut state = self.state.write().await;
        let slot = state
            .availability
            .get_mut(&(tour_id.to_string(), date))
            .ok_or(AppError::DateUnavailable)?;
        slot.reserve(participants)?;
        Ok(slot.clone())
    }

    async fn release(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<Option<TourAvailability>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.release(tour_id, date, participants))
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create_booking(&self, booking: NewBooking) -> Result<(Reservation, Payment), AppError> {
        let mut state = self.state.write().await;

        let slot = state
            .availability
            .get_mut(&(booking.tour_id.clone(), booking.date))
            .ok_or(AppError::DateUnavailable)?;
        slot.reserve(booking.participants)?;

        let client = state.upsert_client(&booking.client);
        let now = Utc::now();

        let reservation = Reservation {
            id: Uuid::new_v4(),
            tour_id: booking.tour_id,
            client_id: client.id,
            vehicle_id: booking.vehicle_id,
            user_id: None,
            date: booking.date,
            time: booking.time,
            participants: booking.participants,
            total_price: booking.total_price,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: booking.payment_method.as_str().to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let payment = Payment {
            id: Uuid::new_v4(),
            reservation_id: reservation.id,
            amount: reservation.total_price,
            currency: booking.currency,
            status: PaymentStatus::Pending,
            provider: booking.payment_method.provider(),
            provider_id: None,
            transaction_id: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        };

        state.reservations.insert(reservation.id, reservation.clone());
        state.payments.insert(reservation.id, payment.clone());
        Ok((reservation, payment))
    }

    async fn attach_payment_session(&self, payment_id: Uuid, session: &PaymentSession) -> Result<Payment, AppError> {
        let metadata = serde_json::to_value(session).map_err(|e| anyhow::anyhow!(e))?;
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .values_mut()
            .find(|p| p.id == payment_id)
            .ok_or(AppError::ResourceNotFound("Payment"))?;
        payment.provider_id = Some(session.provider_id.clone());
        payment.metadata = Some(metadata);
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    async fn abort_booking(&self, reservation_id: Uuid, reason: &str) -> Result<Reservation, AppError> {
        let mut state = self.state.write().await;

        let reservation = state.pending_reservation(reservation_id, ReservationStatus::Cancelled)?;
        reservation.status = ReservationStatus::Cancelled;
        reservation.payment_status = PaymentStatus::Failed;
        reservation.notes = Some(reason.to_string());
        reservation.updated_at = Utc::now();
        let reservation = reservation.clone();

        state.release(&reservation.tour_id, reservation.date, reservation.participants);
        if let Some(payment) = state.payments.get_mut(&reservation_id) {
            payment.status = PaymentStatus::Failed;
            payment.updated_at = Utc::now();
        }
        Ok(reservation)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Reservation>, AppError> {
        Ok(self.state.read().await.reservations.get(&id).cloned())
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<ReservationDetail>, AppError> {
        let state = self.state.read().await;
        let Some(reservation) = state.reservations.get(&id).cloned() else {
            return Ok(None);
        };
        let client = state
            .clients
            .get(&reservation.client_id)
            .cloned()
            .ok_or(AppError::ResourceNotFound("Client"))?;
        let tour_title = state
            .tours
            .get(&reservation.tour_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| reservation.tour_id.clone());
        let vehicle_name = reservation
            .vehicle_id
            .as_ref()
            .and_then(|id| state.vehicles.get(id))
            .map(|v| v.name.clone());

        Ok(Some(ReservationDetail {
            reservation,
            tour_title,
            client,
            vehicle_name,
        }))
    }

    async fn list(&self, status: Option<ReservationStatus>) -> Result<Vec<Reservation>, AppError> {
        let state = self.state.read().await;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn confirm(&self, id: Uuid, user_id: Uuid, vehicle_id: Option<&str>) -> Result<Reservation, AppError> {
        let mut state = self.state.write().await;
        let reservation = state.pending_reservation(id, ReservationStatus::Confirmed)?;
        reservation.status = ReservationStatus::Confirmed;
        reservation.user_id = Some(user_id);
        if let Some(vehicle_id) = vehicle_id {
            reservation.vehicle_id = Some(vehicle_id.to_string());
        }
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }

    async fn reject(&self, id: Uuid, reason: &str) -> Result<Reservation, AppError> {
        let mut state = self.state.write().await;
        let reservation = state.pending_reservation(id, ReservationStatus::Cancelled)?;
        reservation.status = ReservationStatus::Cancelled;
        reservation.notes = Some(reason.to_string());
        reservation.updated_at = Utc::now();
        let reservation = reservation.clone();

        state.release(&reservation.tour_id, reservation.date, reservation.participants);
        Ok(reservation)
    }

    async fn update_payment_status(
        &self,
        reservation_id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Reservation, AppError> {
        let mut state = self.state.write().await;

        let payment = state
            .payments
            .get_mut(&reservation_id)
            .ok_or(AppError::ReservationNotFound)?;
        if payment.status != expected {
            return Err(AppError::InvalidStateTransition {
                from: payment.status.to_string(),
                to: status.to_string(),
            });
        }
        payment.status = status;
        if let Some(tx_id) = transaction_id {
            payment.transaction_id = Some(tx_id.to_string());
        }
        payment.updated_at = Utc::now();

        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .ok_or(AppError::ReservationNotFound)?;
        reservation.payment_status = status;
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn create(&self, payload: &CreateMessagePayload, client_id: Option<Uuid>) -> Result<Message, AppError> {
        let message = Message {
            id: Uuid::new_v4(),
            client_id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            channel: payload.channel,
            subject: payload.subject.clone(),
            content: payload.content.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.state.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn list(&self, query: &MessageQuery) -> Result<Vec<Message>, AppError> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| query.is_read.is_none_or(|r| m.is_read == r))
            .filter(|m| query.channel.is_none_or(|c| m.channel == c))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> Result<Option<Message>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.messages.iter_mut().find(|m| m.id == id).map(|m| {
            m.is_read = is_read;
            m.clone()
        }))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn create(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let notification = notification.into_notification();
        self.state.write().await.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list(&self, query: &NotificationQuery, limit: i64) -> Result<Vec<Notification>, AppError> {
        let state = self.state.read().await;
        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| query.user_id.is_none_or(|id| n.user_id == Some(id)))
            .filter(|n| query.client_id.is_none_or(|id| n.client_id == Some(id)))
            .filter(|n| query.is_read.is_none_or(|r| n.is_read == r))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(notifications)
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> Result<Option<Notification>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.notifications.iter_mut().find(|n| n.id == id).map(|n| {
            n.is_read = is_read;
            n.clone()
        }))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().filter(|u| u.role == role).cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn create_user(&self, email: &str, name: &str, password_hash: &str, role: UserRole) -> Result<User, AppError> {
        let email = email.to_lowercase();
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::BadRequest(format!("User '{email}' already exists")));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, AppError> {
        let email = email.to_lowercase();
        let state = self.state.read().await;
        Ok(state.clients.values().find(|c| c.email == email).cloned())
    }
}
