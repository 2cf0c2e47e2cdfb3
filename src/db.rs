// src/db.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{User, UserRole},
        availability::{AvailabilityQuery, TourAvailability},
        message::{CreateMessagePayload, Message, MessageQuery},
        notification::{NewNotification, Notification, NotificationQuery},
        reservation::{
            Client, NewBooking, Payment, PaymentSession, PaymentStatus, Reservation,
            ReservationDetail, ReservationStatus,
        },
        tour::{Tour, UpdateTourPayload, Vehicle},
    },
};

pub mod availability_repo;
pub mod catalog_repo;
pub mod memory;
pub mod message_repo;
pub mod notification_repo;
pub mod reservation_repo;
pub mod user_repo;

pub use availability_repo::PgAvailabilityRepository;
pub use catalog_repo::PgCatalogRepository;
pub use memory::MemoryStore;
pub use message_repo::PgMessageRepository;
pub use notification_repo::PgNotificationRepository;
pub use reservation_repo::PgReservationRepository;
pub use user_repo::PgUserRepository;

/// Tours e veículos.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_active_tours(&self) -> Result<Vec<Tour>, AppError>;
    async fn find_tour(&self, id: &str) -> Result<Option<Tour>, AppError>;
    async fn create_tour(&self, tour: Tour) -> Result<Tour, AppError>;
    async fn update_tour(&self, id: &str, changes: UpdateTourPayload) -> Result<Option<Tour>, AppError>;
    /// Soft delete (`is_active = false`). Retorna `false` se o tour não existe.
    async fn deactivate_tour(&self, id: &str) -> Result<bool, AppError>;

    async fn list_active_vehicles(&self) -> Result<Vec<Vehicle>, AppError>;
    async fn find_vehicle(&self, id: &str) -> Result<Option<Vehicle>, AppError>;
    async fn create_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, AppError>;
}

/// Contador de vagas por (tour, data).
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn find(&self, tour_id: &str, date: NaiveDate) -> Result<Option<TourAvailability>, AppError>;
    async fn list(&self, query: &AvailabilityQuery) -> Result<Vec<TourAvailability>, AppError>;

    /// Cria ou reconfigura a data. Nunca zera `booked`.
    async fn upsert(
        &self,
        tour_id: &str,
        date: NaiveDate,
        default_capacity: i32,
        capacity: Option<i32>,
        available: Option<bool>,
    ) -> Result<TourAvailability, AppError>;

    /// Checagem e incremento atômicos.
    async fn reserve(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<TourAvailability, AppError>;
    async fn release(&self, tour_id: &str, date: NaiveDate, participants: i32) -> Result<Option<TourAvailability>, AppError>;
}

/// Reservas, clientes e pagamentos. As operações compostas são transacionais.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Reserva vagas, faz upsert do cliente e grava reserva + pagamento PENDING.
    async fn create_booking(&self, booking: NewBooking) -> Result<(Reservation, Payment), AppError>;
    async fn attach_payment_session(&self, payment_id: Uuid, session: &PaymentSession) -> Result<Payment, AppError>;
    /// Desfaz uma reserva cujo checkout falhou: CANCELLED, pagamento FAILED e vagas devolvidas.
    async fn abort_booking(&self, reservation_id: Uuid, reason: &str) -> Result<Reservation, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Reservation>, AppError>;
    async fn find_detail(&self, id: Uuid) -> Result<Option<ReservationDetail>, AppError>;
    async fn list(&self, status: Option<ReservationStatus>) -> Result<Vec<Reservation>, AppError>;

    /// PENDING -> CONFIRMED. Falha com `InvalidStateTransition` se não estiver PENDING.
    async fn confirm(&self, id: Uuid, user_id: Uuid, vehicle_id: Option<&str>) -> Result<Reservation, AppError>;
    /// PENDING -> CANCELLED e devolução das vagas na mesma transação.
    async fn reject(&self, id: Uuid, reason: &str) -> Result<Reservation, AppError>;

    /// Atualiza pagamento e reserva se o status atual ainda for `expected`.
    async fn update_payment_status(
        &self,
        reservation_id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Reservation, AppError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, payload: &CreateMessagePayload, client_id: Option<Uuid>) -> Result<Message, AppError>;
    async fn list(&self, query: &MessageQuery) -> Result<Vec<Message>, AppError>;
    async fn set_read(&self, id: Uuid, is_read: bool) -> Result<Option<Message>, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification, AppError>;
    async fn list(&self, query: &NotificationQuery, limit: i64) -> Result<Vec<Notification>, AppError>;
    async fn set_read(&self, id: Uuid, is_read: bool) -> Result<Option<Notification>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, AppError>;
    async fn create_user(&self, email: &str, name: &str, password_hash: &str, role: UserRole) -> Result<User, AppError>;
    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, AppError>;
}

// Conjunto de repositórios injetado nos serviços
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
            availability: Arc::new(PgAvailabilityRepository::new(pool.clone())),
            reservations: Arc::new(PgReservationRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            catalog: Arc::new(store.clone()),
            availability: Arc::new(store.clone()),
            reservations: Arc::new(store.clone()),
            messages: Arc::new(store.clone()),
            notifications: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}
