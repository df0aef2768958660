//! # Integration Tests for stockbook-api
//!
//! Drives the assembled router end to end: account lifecycle, product CRUD,
//! stock ledger flows (including insufficient-stock conflicts and alert
//! deduplication), alert acknowledgement, dashboard aggregation, health
//! probes, and the OpenAPI spec.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use stockbook_api::state::{AppConfig, AppState};

/// Helper: state with a fast bcrypt cost for tests.
fn test_state() -> AppState {
    AppState::with_config(
        AppConfig {
            port: 8080,
            bcrypt_cost: 4,
        },
        None,
    )
}

/// Helper: build the test app, returning the router and its state handle.
fn test_app() -> (axum::Router, AppState) {
    let state = test_state();
    (stockbook_api::app(state.clone()), state)
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: POST a JSON body.
fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("auth-token", token);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Helper: PUT a JSON body.
fn put_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .header("auth-token", token)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Helper: GET with a token.
fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("auth-token", token)
        .body(Body::empty())
        .unwrap()
}

/// Helper: sign up a user and return their session token.
async fn signup(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/signup",
            None,
            serde_json::json!({
                "name": "Test Operator",
                "email": email,
                "password": "s3cret"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

/// Helper: create a product and return its ID.
async fn create_product(app: &axum::Router, token: &str, barcode: i64) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/products",
            Some(token),
            serde_json::json!({
                "name": "Widget",
                "price": 9.99,
                "barcode": barcode
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["id"].as_str().unwrap().to_string()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Accounts -----------------------------------------------------------------

#[tokio::test]
async fn test_signup_issues_token_and_me_works() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(get_authed("/v1/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "ops@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let (app, _) = test_app();
    signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(post_json(
            "/v1/auth/signup",
            None,
            serde_json::json!({
                "name": "Other",
                "email": "OPS@example.com",
                "password": "s3cret"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_validation_failures() {
    let (app, _) = test_app();

    // Short name.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/signup",
            None,
            serde_json::json!({"name": "ab", "email": "a@b.co", "password": "s3cret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Implausible email.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/signup",
            None,
            serde_json::json!({"name": "Ada", "email": "not-an-email", "password": "s3cret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Short password.
    let response = app
        .oneshot(post_json(
            "/v1/auth/signup",
            None,
            serde_json::json!({"name": "Ada", "email": "a@b.co", "password": "1234"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_round_trip_and_uniform_failure() {
    let (app, _) = test_app();
    signup(&app, "ops@example.com").await;

    // Correct credentials.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            None,
            serde_json::json!({"email": "ops@example.com", "password": "s3cret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].as_str().unwrap().len() == 64);

    // Wrong password and unknown email produce the same message.
    let wrong_pw = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            None,
            serde_json::json!({"email": "ops@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
    let wrong_pw_body = body_json(wrong_pw).await;

    let unknown = app
        .oneshot(post_json(
            "/v1/auth/login",
            None,
            serde_json::json!({"email": "ghost@example.com", "password": "s3cret"}),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = body_json(unknown).await;

    assert_eq!(wrong_pw_body["error"]["message"], unknown_body["error"]["message"]);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

// -- Products -----------------------------------------------------------------

#[tokio::test]
async fn test_create_product_seeds_demo_stock() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(post_json(
            "/v1/products",
            Some(&token),
            serde_json::json!({"name": "Widget", "price": 9.99, "barcode": 8801}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["total_stock"], 50);
    assert_eq!(body["stock_status"], "In Stock");
    assert_eq!(body["stock"]["location_stock"][0]["location"], "Main Warehouse");
}

#[tokio::test]
async fn test_create_product_duplicate_barcode_conflicts() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    create_product(&app, &token, 8801).await;

    let response = app
        .oneshot(post_json(
            "/v1/products",
            Some(&token),
            serde_json::json!({"name": "Clone", "price": 1.0, "barcode": 8801}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_product_not_found() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(get_authed(
            "/v1/products/550e8400-e29b-41d4-a716-446655440000",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_product() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    // Update catalog fields.
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/v1/products/{id}"),
            &token,
            serde_json::json!({"name": "Widget Pro", "price": 19.99, "barcode": 8802}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Widget Pro");
    assert_eq!(body["barcode"], 8802);
    // Stock is untouched by catalog updates.
    assert_eq!(body["total_stock"], 50);

    // Delete.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/products/{id}"))
                .header("auth-token", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_authed(&format!("/v1/products/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_product_barcode_collision_conflicts() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    create_product(&app, &token, 8801).await;
    let second = create_product(&app, &token, 8802).await;

    let response = app
        .oneshot(put_json(
            &format!("/v1/products/{second}"),
            &token,
            serde_json::json!({"name": "Widget", "price": 9.99, "barcode": 8801}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// -- Stock Operations ---------------------------------------------------------

#[tokio::test]
async fn test_stock_add_and_remove_flow() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    // Add 30 at a new location.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/add"),
            Some(&token),
            serde_json::json!({"location": "Downtown Store", "quantity": 30, "reason": "restock"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["new_stock_level"], 80);

    // Remove 20 from the seeded warehouse.
    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 20, "reference": "SO-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["new_stock_level"], 60);
}

#[tokio::test]
async fn test_stock_remove_insufficient_conflicts() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 51}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("insufficient stock"));

    // Nothing applied.
    let product = state.products.list().pop().unwrap();
    assert_eq!(product.stock.total_stock, 50);
    assert!(product.stock.movements.is_empty());
}

#[tokio::test]
async fn test_stock_zero_quantity_rejected() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/add"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_low_stock_alert_raised_once_and_after_resolve() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    // Pull the warehouse down to 8 (min level 10) — raises one low_stock alert.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 42}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.alerts.len(), 1);

    // Another removal while still breached must NOT create a duplicate.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.alerts.len(), 1, "open alert must not be duplicated");

    let alert = state.alerts.list().pop().unwrap();
    assert_eq!(alert.kind.as_str(), "low_stock");
    assert_eq!(alert.threshold, 10);

    // Resolve the alert, breach again: a fresh alert may now be raised.
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/v1/alerts/{}/resolve", alert.id),
            &token,
            serde_json::json!({"resolved_note": "restock ordered"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.alerts.len(), 2, "resolved slot frees a new alert");
}

#[tokio::test]
async fn test_out_of_stock_alert_is_critical() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 50}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let alert = state.alerts.list().pop().unwrap();
    assert_eq!(alert.kind.as_str(), "out_of_stock");
    assert_eq!(alert.severity.as_str(), "critical");
    assert_eq!(alert.current_quantity, 0);
}

#[tokio::test]
async fn test_damage_records_damaged_alert() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/damage"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 4, "reason": "dropped"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["new_stock_level"], 46);

    let alert = state.alerts.list().pop().unwrap();
    assert_eq!(alert.kind.as_str(), "damaged_items");
    assert_eq!(alert.current_quantity, 4);

    let product = state.products.list().pop().unwrap();
    assert_eq!(product.stock.location("Main Warehouse").unwrap().damaged, 4);
}

#[tokio::test]
async fn test_transfer_moves_stock_between_locations() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/transfer"),
            Some(&token),
            serde_json::json!({
                "from_location": "Main Warehouse",
                "to_location": "Mall Outlet",
                "quantity": 15
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["new_stock_level"], 50, "transfer conserves total stock");

    let product = state.products.list().pop().unwrap();
    assert_eq!(product.stock.quantity_at("Main Warehouse"), 35);
    assert_eq!(product.stock.quantity_at("Mall Outlet"), 15);
    assert_eq!(product.stock.movements.len(), 2);

    // Same-location transfer is rejected.
    let response = app
        .oneshot(post_json(
            &format!("/v1/stock/{id}/transfer"),
            Some(&token),
            serde_json::json!({
                "from_location": "Main Warehouse",
                "to_location": "Main Warehouse",
                "quantity": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_movements_are_paginated_newest_first() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/v1/stock/{id}/add"),
                Some(&token),
                serde_json::json!({"location": "Main Warehouse", "quantity": 5}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_authed(
            &format!("/v1/stock/{id}/movements?limit=2&offset=0"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_movements"], 3);
    assert_eq!(body["movements"].as_array().unwrap().len(), 2);
    assert_eq!(body["movements"][0]["performed_by_name"], "Test Operator");
    assert_eq!(body["product"]["total_stock"], 65);
}

// -- Locations ----------------------------------------------------------------

#[tokio::test]
async fn test_location_lifecycle() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    // Seed defaults.
    let response = app
        .clone()
        .oneshot(post_json("/v1/locations/initialize", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 3);

    // Second run is a no-op.
    let response = app
        .clone()
        .oneshot(post_json("/v1/locations/initialize", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["message"], "Locations already exist");

    // Create a new one; duplicate code conflicts.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/locations",
            Some(&token),
            serde_json::json!({"code": "dc-east", "name": "East DC", "kind": "distribution_center"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/locations",
            Some(&token),
            serde_json::json!({"code": "dc-east", "name": "Duplicate"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Listing returns the four active locations.
    let response = app.oneshot(get_authed("/v1/locations", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_location_invalid_code_rejected() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(post_json(
            "/v1/locations",
            Some(&token),
            serde_json::json!({"code": "Not A Code", "name": "Bad"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Alerts -------------------------------------------------------------------

#[tokio::test]
async fn test_alert_filters_and_read_flow() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    // Raise a critical out_of_stock alert and a medium damaged_items alert.
    app.clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 50}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/return"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 10}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/damage"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(state.alerts.len(), 2);

    // Severity filter.
    let response = app
        .clone()
        .oneshot(get_authed("/v1/alerts?severity=critical", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["kind"], "out_of_stock");

    // Unknown severity is a validation error.
    let response = app
        .clone()
        .oneshot(get_authed("/v1/alerts?severity=apocalyptic", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Mark one read; the unread filter then excludes it.
    let alert_id = body_json(
        app.clone()
            .oneshot(get_authed("/v1/alerts", &token))
            .await
            .unwrap(),
    )
    .await[0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/v1/alerts/{alert_id}/read"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_read"], true);

    let response = app
        .oneshot(get_authed("/v1/alerts?unread=true", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resolve_alert_records_actor_and_note() {
    let (app, state) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let id = create_product(&app, &token, 8801).await;

    app.clone()
        .oneshot(post_json(
            &format!("/v1/stock/{id}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 45}),
        ))
        .await
        .unwrap();
    let alert = state.alerts.list().pop().unwrap();

    let response = app
        .oneshot(put_json(
            &format!("/v1/alerts/{}/resolve", alert.id),
            &token,
            serde_json::json!({"resolved_note": "counted and restocked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_resolved"], true);
    assert_eq!(body["resolved_note"], "counted and restocked");
    assert!(body["resolved_by"].is_string());
    assert!(body["resolved_at"].is_string());
}

#[tokio::test]
async fn test_alert_not_found() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(put_json(
            "/v1/alerts/550e8400-e29b-41d4-a716-446655440000/read",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Dashboard ----------------------------------------------------------------

#[tokio::test]
async fn test_dashboard_stats_aggregate() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;
    let first = create_product(&app, &token, 8801).await;
    create_product(&app, &token, 8802).await;

    // Seed locations and empty out the first product.
    app.clone()
        .oneshot(post_json("/v1/locations/initialize", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/v1/stock/{first}/remove"),
            Some(&token),
            serde_json::json!({"location": "Main Warehouse", "quantity": 50}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_authed("/v1/dashboard/stats", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_products"], 2);
    assert_eq!(body["low_stock_products"], 1);
    assert_eq!(body["out_of_stock_products"], 1);
    assert_eq!(body["unread_alerts"], 1);
    assert_eq!(body["locations"], 3);

    let recent = body["recent_movements"].as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["movement"]["kind"], "outbound");
    assert_eq!(recent[0]["user"], "Test Operator");
}

// -- Operational endpoints ----------------------------------------------------

#[tokio::test]
async fn test_metrics_endpoint_is_unauthenticated() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("stockbook_products_total"));
}

#[tokio::test]
async fn test_openapi_spec_requires_token() {
    let (app, _) = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = signup(&app, "ops@example.com").await;
    let response = app
        .oneshot(get_authed("/openapi.json", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"].get("/v1/products").is_some());
}

#[tokio::test]
async fn test_malformed_json_body_is_422() {
    let (app, _) = test_app();
    let token = signup(&app, "ops@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/products")
                .header("content-type", "application/json")
                .header("auth-token", &token)
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
