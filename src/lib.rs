// src/lib.rs

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::AppState;

use crate::middleware::auth::auth_guard;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(docs::ApiDoc::openapi())
}

/// Router completo da API.
pub fn app(state: AppState) -> Router {
    // Rotas públicas (site)
    let public_routes = Router::new()
        .route("/health", get(handlers::site::health))
        .route("/stats", get(handlers::site::stats))
        .route("/auth/login", post(handlers::auth::login))
        .route("/tours", get(handlers::tours::list_tours))
        .route("/tours/{id}", get(handlers::tours::get_tour))
        .route("/vehicles", get(handlers::vehicles::list_vehicles))
        .route("/availability", get(handlers::availability::list_availability))
        .route("/reservations", post(handlers::reservations::create_reservation))
        .route("/payments/webhook", post(handlers::payments::payment_webhook))
        .route("/messages", post(handlers::messages::create_message))
        .route("/quotes", post(handlers::quotes::create_quote));

    // Rotas da equipe (protegidas pelo middleware)
    let staff_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/tours", post(handlers::tours::create_tour))
        .route(
            "/tours/{id}",
            put(handlers::tours::update_tour).delete(handlers::tours::delete_tour),
        )
        .route("/vehicles", post(handlers::vehicles::create_vehicle))
        .route("/availability", post(handlers::availability::set_availability))
        .route("/reservations", get(handlers::reservations::list_reservations))
        .route("/reservations/{id}", get(handlers::reservations::get_reservation))
        .route(
            "/reservations/{id}/confirm",
            post(handlers::reservations::confirm_reservation),
        )
        .route(
            "/reservations/{id}/reject",
            post(handlers::reservations::reject_reservation),
        )
        .route(
            "/messages",
            get(handlers::messages::list_messages).put(handlers::messages::mark_message_read),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications)
                .put(handlers::notifications::mark_notification_read),
        )
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE]);

    Router::new()
        .nest("/api", public_routes.merge(staff_routes))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
