// src/handlers.rs

pub mod auth;
pub mod availability;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod quotes;
pub mod reservations;
pub mod site;
pub mod tours;
pub mod vehicles;
