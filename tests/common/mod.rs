//! Shared setup for the router-level integration tests.
//!
//! Everything runs against the in-memory store, a fake payment gateway and a
//! transport that records outbound WhatsApp/e-mail instead of sending them.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use tours_backend::{
    app,
    common::error::AppError,
    config::{AppState, Config},
    db::{MemoryStore, Repositories},
    models::{auth::UserRole, reservation::PaymentSession},
    services::{
        notification_service::NotificationTransport,
        payment_service::{CheckoutRequest, PaymentGateway, PaymentGateways},
    },
};

pub const GUIDE_EMAIL: &str = "guia@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "barrancas-2026";

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    WhatsApp { to: String, body: String },
    Email { to: String, subject: String, html: String },
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send_whatsapp(&self, to: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(Sent::WhatsApp { to: to.into(), body: body.into() });
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(Sent::Email {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
        });
        Ok(())
    }
}

/// Gateway that always opens a session, like a sandbox provider.
pub struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<PaymentSession, AppError> {
        Ok(PaymentSession {
            provider_id: format!("pi_{}", request.reservation_id.simple()),
            client_secret: Some("secret_test".into()),
            checkout_url: None,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub transport: Arc<RecordingTransport>,
    pub guide_id: Uuid,
    pub guide_token: String,
    pub admin_token: String,
}

pub fn tour_date() -> NaiveDate {
    (Utc::now() + Duration::days(30)).date_naive()
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = Config::local("integration-secret");
    config.bcrypt_cost = 4;
    config.staff_whatsapp_to = Some("+5216140000000".into());
    customize(&mut config);

    let repos = Repositories::in_memory(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let gateways = PaymentGateways {
        stripe: Some(Arc::new(FakeGateway)),
        mercadopago: Some(Arc::new(FakeGateway)),
    };

    let state = AppState::build(&config, repos.clone(), gateways, transport.clone()).unwrap();
    state.catalog.seed_defaults().await.unwrap();

    let guide = state
        .auth_service
        .create_user(GUIDE_EMAIL, "Guía Rarámuri", PASSWORD, UserRole::Guide)
        .await
        .unwrap();
    state
        .auth_service
        .create_user(ADMIN_EMAIL, "Admin", PASSWORD, UserRole::Admin)
        .await
        .unwrap();

    let router = app(state);
    let guide_token = login(&router, GUIDE_EMAIL).await;
    let admin_token = login(&router, ADMIN_EMAIL).await;

    TestApp {
        router,
        repos,
        transport,
        guide_id: guide.id,
        guide_token,
        admin_token,
    }
}

async fn login(router: &Router, email: &str) -> String {
    let (status, body) = send(
        router,
        json_request(
            Method::POST,
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": PASSWORD }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Helper to create a JSON request, optionally authenticated.
pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(serde_json::to_string(&body).unwrap())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

impl TestApp {
    /// Opens `date` for `tour_id` with the given capacity (admin call).
    pub async fn open_date(&self, tour_id: &str, date: NaiveDate, capacity: i32) {
        let (status, _) = send(
            &self.router,
            json_request(
                Method::POST,
                "/api/availability",
                serde_json::json!({ "tourId": tour_id, "dates": [date], "capacity": capacity }),
                Some(&self.admin_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    pub async fn book(&self, tour_id: &str, date: NaiveDate, participants: i32) -> (StatusCode, Value) {
        send(
            &self.router,
            json_request(
                Method::POST,
                "/api/reservations",
                serde_json::json!({
                    "tourId": tour_id,
                    "date": date,
                    "time": "08:00",
                    "participants": participants,
                    "paymentMethod": "manual",
                    "client": {
                        "name": "Ana López",
                        "email": "ana@example.com",
                        "phone": "+5216141234567",
                        "country": "México"
                    }
                }),
                None,
            ),
        )
        .await
    }

    pub async fn booked(&self, tour_id: &str, date: NaiveDate) -> i32 {
        self.repos
            .availability
            .find(tour_id, date)
            .await
            .unwrap()
            .map(|slot| slot.booked)
            .unwrap_or(0)
    }
}
