//! Catalog, payments webhook, inbox, quotes and auth through the router.

mod common;

use axum::http::{Method, StatusCode};
use common::{get_request, json_request, send, spawn_app, spawn_app_with, tour_date, ADMIN_EMAIL};
use serde_json::json;

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_wrong_password() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "email": ADMIN_EMAIL, "password": "wrong" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_me_never_exposes_password_hash() {
    let app = spawn_app().await;
    let (status, body) = send(&app.router, get_request("/api/auth/me", Some(&app.admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], "ADMIN");
    assert!(body.get("passwordHash").is_none());
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_public_catalog_reads() {
    let app = spawn_app_with(|config| config.featured_tour_id = Some("tour-basaseachi".into())).await;

    let (status, tours) = send(&app.router, get_request("/api/tours", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tours.as_array().unwrap().len(), 10);
    assert_eq!(tours[0]["id"], "tour-basaseachi");

    let (status, vehicles) = send(&app.router, get_request("/api/vehicles", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vehicles.as_array().unwrap().len(), 2);

    let (status, stats) = send(&app.router, get_request("/api/stats", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["happyClients"], 2400);

    let (status, _) = send(&app.router, get_request("/api/tours/tour-nowhere", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tour_detail_lists_open_dates_only() {
    let app = spawn_app().await;
    let open = tour_date();
    let closed = open.succ_opt().unwrap();
    app.open_date("tour-creel", open, 10).await;

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/availability",
            json!({ "tourId": "tour-creel", "dates": [closed], "available": false }),
            Some(&app.admin_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, detail) = send(&app.router, get_request("/api/tours/tour-creel", None)).await;
    assert_eq!(status, StatusCode::OK);
    let dates = detail["availability"].as_array().unwrap();
    assert_eq!(dates.len(), 1);
    assert_eq!(dates[0]["date"], open.to_string());

    let (status, slots) = send(&app.router, get_request("/api/availability?tourId=tour-creel", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slots.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_only_admins_edit_the_catalog() {
    let app = spawn_app().await;
    let payload = json!({
        "title": "Sierra Tarahumara Express",
        "price": 990,
        "duration": 6,
        "maxCapacity": 8
    });

    let (status, _) = send(
        &app.router,
        json_request(Method::POST, "/api/tours", payload.clone(), Some(&app.guide_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, tour) = send(
        &app.router,
        json_request(Method::POST, "/api/tours", payload, Some(&app.admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = tour["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("tour-"));

    let (status, _) = send(
        &app.router,
        json_request(Method::DELETE, &format!("/api/tours/{id}"), json!({}), Some(&app.admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tours) = send(&app.router, get_request("/api/tours", None)).await;
    assert!(tours.as_array().unwrap().iter().all(|t| t["id"] != id.as_str()));
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_booked() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-batopilas", date, 12).await;
    app.book("tour-batopilas", date, 5).await;

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/availability",
            json!({ "tourId": "tour-batopilas", "dates": [date], "capacity": 4 }),
            Some(&app.admin_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.booked("tour-batopilas", date).await, 5);
}

// ============================================================================
// Payment webhook
// ============================================================================

#[tokio::test]
async fn test_paid_webhook_notifies_guide() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;
    let (_, created) = app.book("tour-basaseachi", date, 2).await;
    let id = created["reservation"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/payments/webhook",
            json!({ "reservationId": id, "paymentStatus": "PAID", "transactionId": "tx-77" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["reservation"]["paymentStatus"], "PAID");
    assert_eq!(body["reservation"]["status"], "PENDING");

    let (_, inbox) = send(
        &app.router,
        get_request(&format!("/api/notifications?userId={}", app.guide_id), Some(&app.guide_token)),
    )
    .await;
    assert_eq!(inbox[0]["type"], "PAYMENT_RECEIVED");
    assert_eq!(inbox[0]["title"], "Pago Recibido - Pendiente de Aprobación");
}

#[tokio::test]
async fn test_webhook_missing_fields() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        json_request(Method::POST, "/api/payments/webhook", json!({ "paymentStatus": "PAID" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_webhook_secret_is_enforced_when_configured() {
    let app = spawn_app_with(|config| config.payment_webhook_secret = Some("hook-secret".into())).await;
    let date = tour_date();
    app.open_date("tour-creel", date, 10).await;
    let (_, created) = app.book("tour-creel", date, 1).await;
    let body = json!({ "reservationId": created["reservation"]["id"], "paymentStatus": "PAID" });

    let (status, _) = send(
        &app.router,
        json_request(Method::POST, "/api/payments/webhook", body.clone(), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = json_request(Method::POST, "/api/payments/webhook", body, None);
    request
        .headers_mut()
        .insert("x-webhook-secret", "hook-secret".parse().unwrap());
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Inbox
// ============================================================================

#[tokio::test]
async fn test_messages_inbox_flow() {
    let app = spawn_app().await;

    let (status, message) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/messages",
            json!({
                "name": "Luis",
                "email": "luis@example.com",
                "channel": "WHATSAPP",
                "content": "¿Tienen lugar para 6 en diciembre?"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["isRead"], false);

    let (status, _) = send(&app.router, get_request("/api/messages", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        json_request(
            Method::PUT,
            "/api/messages",
            json!({ "id": message["id"], "isRead": true }),
            Some(&app.guide_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, unread) = send(&app.router, get_request("/api/messages?isRead=false", Some(&app.guide_token))).await;
    assert!(unread.as_array().unwrap().is_empty());

    let (_, inbox) = send(
        &app.router,
        get_request(&format!("/api/notifications?userId={}", app.guide_id), Some(&app.guide_token)),
    )
    .await;
    assert_eq!(inbox[0]["type"], "MESSAGE_RECEIVED");
    assert_eq!(inbox[0]["title"], "Nuevo mensaje de WHATSAPP");
}

// ============================================================================
// Quotes and docs
// ============================================================================

#[tokio::test]
async fn test_quote_builds_whatsapp_link() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/quotes",
            json!({
                "tours": [
                    { "tourId": "tour-basaseachi", "participants": 4 },
                    { "tourId": "tour-creel", "participants": 2, "time": "09:00" }
                ],
                "vehicleId": "vehicle-2",
                "contact": { "name": "Ana", "phone": "+5216141234567" }
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalParticipants"], 6);
    assert!(body["whatsappUrl"].as_str().unwrap().starts_with("https://wa.me/526351200217?text="));
    assert!(body["message"].as_str().unwrap().contains("- Preferencia: SUV Premium"));
}

#[tokio::test]
async fn test_quote_without_tours_is_rejected() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/quotes",
            json!({ "tours": [], "contact": { "name": "Ana", "phone": "+52" } }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Agrega al menos un tour a tu cotización");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let (status, doc) = send(&app.router, get_request("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/reservations/{id}/reject"].is_object());
    assert!(doc["components"]["securitySchemes"]["api_jwt"].is_object());
}
