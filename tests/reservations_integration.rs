//! Reservation lifecycle through the HTTP router.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{get_request, json_request, send, spawn_app, tour_date, Sent};
use serde_json::json;
use tours_backend::models::notification::NotificationQuery;

// ============================================================================
// Capacity
// ============================================================================

#[tokio::test]
async fn test_last_seats_of_a_nearly_full_date() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;

    let (status, _) = app.book("tour-basaseachi", date, 17).await;
    assert_eq!(status, StatusCode::CREATED);

    // 17 + 2 > 18
    let (status, body) = app.book("tour-basaseachi", date, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Not enough capacity");
    assert_eq!(app.booked("tour-basaseachi", date).await, 17);

    let (status, body) = app.book("tour-basaseachi", date, 1).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reservation"]["status"], "PENDING");
    assert_eq!(body["payment"]["status"], "PENDING");
    assert_eq!(app.booked("tour-basaseachi", date).await, 18);

    // Lotado: a data passa a indisponível
    let (status, body) = app.book("tour-basaseachi", date, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date not available");
}

#[tokio::test]
async fn test_party_above_tour_max_is_rejected_without_touching_ledger() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;

    let (status, _) = app.book("tour-basaseachi", date, 19).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.booked("tour-basaseachi", date).await, 0);
}

#[tokio::test]
async fn test_unconfigured_date_is_not_available() {
    let app = spawn_app().await;
    let (status, body) = app.book("tour-creel", tour_date(), 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date not available");
}

#[tokio::test]
async fn test_unknown_tour_is_404() {
    let app = spawn_app().await;
    let (status, body) = app.book("tour-atlantida", tour_date(), 2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tour not found");
}

#[tokio::test]
async fn test_errors_follow_accept_language() {
    let app = spawn_app().await;
    let mut request = json_request(
        Method::POST,
        "/api/reservations",
        json!({
            "tourId": "tour-creel",
            "date": tour_date(),
            "participants": 1,
            "paymentMethod": "manual",
            "client": { "name": "Ana", "email": "ana@example.com", "phone": "+52" }
        }),
        None,
    );
    request
        .headers_mut()
        .insert("accept-language", "es-MX,es;q=0.9".parse().unwrap());

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Fecha no disponible");
}

#[tokio::test]
async fn test_invalid_client_is_a_validation_error() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-creel", date, 10).await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/reservations",
            json!({
                "tourId": "tour-creel",
                "date": date,
                "participants": 0,
                "paymentMethod": "manual",
                "client": { "name": "Ana", "email": "ana@example.com", "phone": "+52" }
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["participants"].is_array());
    assert_eq!(app.booked("tour-creel", date).await, 0);
}

// ============================================================================
// Pricing and payment sessions
// ============================================================================

#[tokio::test]
async fn test_total_price_is_frozen_after_tour_price_change() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;

    let (_, created) = app.book("tour-basaseachi", date, 3).await;
    assert_eq!(created["reservation"]["totalPrice"], 4800.0);
    let id = created["reservation"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app.router,
        json_request(
            Method::PUT,
            "/api/tours/tour-basaseachi",
            json!({ "price": 2500 }),
            Some(&app.admin_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, detail) = send(
        &app.router,
        get_request(&format!("/api/reservations/{id}"), Some(&app.guide_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["reservation"]["totalPrice"], 4800.0);
    assert_eq!(detail["tourTitle"], "Cascada de Basaseachi");
}

#[tokio::test]
async fn test_stripe_booking_stores_provider_session() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-creel", date, 10).await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/reservations",
            json!({
                "tourId": "tour-creel",
                "date": date,
                "participants": 2,
                "paymentMethod": "stripe",
                "client": { "name": "Ana", "email": "ana@example.com", "phone": "+52" }
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["payment"]["provider"], "STRIPE");
    assert!(body["payment"]["providerId"].as_str().unwrap().starts_with("pi_"));
    assert_eq!(body["payment"]["metadata"]["clientSecret"], "secret_test");
}

// ============================================================================
// Staff transitions
// ============================================================================

#[tokio::test]
async fn test_confirm_twice_is_a_conflict() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;
    let (_, created) = app.book("tour-basaseachi", date, 2).await;
    let id = created["reservation"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/reservations/{id}/confirm");

    let (status, body) = send(
        &app.router,
        json_request(Method::POST, &uri, json!({ "vehicleId": "vehicle-1" }), Some(&app.guide_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CONFIRMED");
    assert_eq!(body["vehicleId"], "vehicle-1");
    assert_eq!(body["userId"], app.guide_id.to_string());

    let (status, _) = send(&app.router, json_request(Method::POST, &uri, json!({}), Some(&app.guide_token))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.booked("tour-basaseachi", date).await, 2);

    let confirmation_sent = app.transport.sent().iter().any(|s| {
        matches!(s, Sent::Email { subject, html, .. } if subject == "Reserva Confirmada" && html.contains("Van Comfort"))
    });
    assert!(confirmation_sent);
}

#[tokio::test]
async fn test_reject_releases_seats_and_tells_the_client_why() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;
    let (_, created) = app.book("tour-basaseachi", date, 3).await;
    let id = created["reservation"]["id"].as_str().unwrap().to_string();
    let client_id = created["reservation"]["clientId"].as_str().unwrap().parse().unwrap();
    assert_eq!(app.booked("tour-basaseachi", date).await, 3);

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            &format!("/api/reservations/{id}/reject"),
            json!({ "reason": "no disponibilidad de guía" }),
            Some(&app.guide_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(body["notes"], "no disponibilidad de guía");
    assert_eq!(app.booked("tour-basaseachi", date).await, 0);

    let inbox = app
        .repos
        .notifications
        .list(&NotificationQuery { client_id: Some(client_id), ..Default::default() }, 50)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].title, "Reserva Rechazada");
    assert!(inbox[0].message.contains("no disponibilidad de guía"));
    assert!(inbox[0].message.contains("Cascada de Basaseachi"));

    let whatsapp_to_client = app.transport.sent().iter().any(|s| {
        matches!(s, Sent::WhatsApp { to, body } if to == "+5216141234567" && body.contains("no disponibilidad de guía"))
    });
    assert!(whatsapp_to_client);
}

#[tokio::test]
async fn test_second_reject_does_not_release_twice() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;
    app.book("tour-basaseachi", date, 4).await;
    let (_, created) = app.book("tour-basaseachi", date, 3).await;
    let uri = format!("/api/reservations/{}/reject", created["reservation"]["id"].as_str().unwrap());

    let (status, body) = send(&app.router, json_request(Method::POST, &uri, json!({}), Some(&app.guide_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "Reserva rechazada por el guía");
    assert_eq!(app.booked("tour-basaseachi", date).await, 4);

    let (status, _) = send(&app.router, json_request(Method::POST, &uri, json!({}), Some(&app.guide_token))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.booked("tour-basaseachi", date).await, 4);
}

#[tokio::test]
async fn test_staff_routes_require_a_token() {
    let app = spawn_app().await;
    let (status, body) = send(&app.router, get_request("/api/reservations", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&app.router, get_request("/api/reservations", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_reservation_fans_out_notifications() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-creel", date, 10).await;
    app.book("tour-creel", date, 2).await;

    let (status, inbox) = send(
        &app.router,
        get_request(&format!("/api/notifications?userId={}", app.guide_id), Some(&app.guide_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox[0]["type"], "NEW_RESERVATION");
    assert_eq!(inbox[0]["title"], "Nueva Reserva");

    let sent = app.transport.sent();
    assert!(sent.iter().any(|s| matches!(s, Sent::WhatsApp { to, .. } if to == "+5216140000000")));
    assert!(sent
        .iter()
        .any(|s| matches!(s, Sent::Email { to, subject, .. } if to == "ana@example.com" && subject == "Reserva Recibida")));
}

// ============================================================================
// Malformed input
// ============================================================================

#[tokio::test]
async fn test_missing_field_is_a_json_bad_request() {
    let app = spawn_app().await;
    let date = tour_date();
    app.open_date("tour-basaseachi", date, 18).await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/reservations",
            json!({
                "tourId": "tour-basaseachi",
                "date": date,
                "time": "08:00",
                "paymentMethod": "manual",
                "client": { "name": "Ana", "email": "ana@example.com", "phone": "+52" }
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The request could not be read.");
    assert!(body["details"]["reason"].as_str().unwrap().contains("participants"));
    assert_eq!(app.booked("tour-basaseachi", date).await, 0);
}

#[tokio::test]
async fn test_unknown_payment_status_is_a_json_bad_request() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/payments/webhook",
            json!({ "reservationId": uuid::Uuid::new_v4(), "paymentStatus": "BOGUS" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["reason"].as_str().unwrap().contains("BOGUS"));
}

#[tokio::test]
async fn test_broken_json_is_localized() {
    let app = spawn_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/reservations")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "es-MX")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No se pudo leer la solicitud.");
}

#[tokio::test]
async fn test_invalid_reservation_id_in_path() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        get_request("/api/reservations/not-a-uuid", Some(&app.guide_token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The request could not be read.");
}
