// src/services.rs

pub mod auth;
pub mod availability_service;
pub mod catalog_service;
pub mod message_service;
pub mod notification_service;
pub mod payment_service;
pub mod quote_service;
pub mod reservation_service;
