pub mod auth;
pub mod availability;
pub mod message;
pub mod notification;
pub mod quote;
pub mod reservation;
pub mod tour;
