//! End-to-end tests: the full router against an in-memory database.

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use mesa_api::{app, AppState, JwtManager};
use mesa_core::MAX_AMOUNT;
use mesa_db::{Database, DbConfig};

const PRIVATE_PEM: &[u8] = include_bytes!("fixtures/private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("fixtures/public.pem");
const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("fixtures/other_private.pem");
const OTHER_PUBLIC_PEM: &[u8] = include_bytes!("fixtures/other_public.pem");

// =============================================================================
// Helpers
// =============================================================================

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let jwt = JwtManager::from_pem(PRIVATE_PEM, PUBLIC_PEM, 36).unwrap();
    app(AppState::new(db, jwt))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

async fn put(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "Ana Torres", "email": email, "password": "password-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "password-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn owner_with_restaurant(app: &Router, email: &str) -> (String, String) {
    register(app, email).await;
    let token = login(app, email).await;
    let (status, body) = post(app, "/restaurants", &token, json!({ "name": "La Mesa" })).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (token, body["id"].as_str().unwrap().to_string())
}

async fn create_menu_item(
    app: &Router,
    token: &str,
    restaurant_id: &str,
    name: &str,
    price: i64,
    ingredient_prices: &[i64],
) -> (StatusCode, Value) {
    let ingredients: Vec<Value> = ingredient_prices
        .iter()
        .enumerate()
        .map(|(i, p)| json!({ "name": format!("Part {i}"), "quantity": 1.0, "unit": "unit", "price": p }))
        .collect();
    post(
        app,
        &format!("/restaurants/{restaurant_id}/menu-items"),
        token,
        json!({ "name": name, "price": price, "ingredients": ingredients }),
    )
    .await
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_register_login_and_me() {
    let app = test_app().await;
    let id = register(&app, "ana@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "ana@example.com", "password": "password-456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "password-999" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let token = login(&app, "ana@example.com").await;
    let (status, me) = get(&app, "/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id.as_str());
    assert_eq!(me["email"], "ana@example.com");
    assert!(me.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_invalid_registration_payload() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "Ana", "email": "not-an-email", "password": "password-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_bearer_token_required() {
    let app = test_app().await;
    let user_id = register(&app, "ana@example.com").await;

    let (status, body) = send(&app, Method::GET, "/restaurants", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let request = Request::builder()
        .uri("/restaurants")
        .header(AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/restaurants", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = JwtManager::from_pem(OTHER_PRIVATE_PEM, OTHER_PUBLIC_PEM, 36)
        .unwrap()
        .issue_token(&user_id)
        .unwrap();
    let (status, _) = get(&app, "/restaurants", &foreign).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = JwtManager::from_pem(PRIVATE_PEM, PUBLIC_PEM, 36)
        .unwrap()
        .issue_token_at(&user_id, Utc::now() - Duration::hours(40))
        .unwrap();
    let (status, _) = get(&app, "/restaurants", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = test_app().await;
    register(&app, "ana@example.com").await;
    let token = login(&app, "ana@example.com").await;

    let (status, _) = put(
        &app,
        "/auth/password",
        &token,
        json!({ "currentPassword": "password-123", "newPassword": "brand-new-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Access
// =============================================================================

#[tokio::test]
async fn test_other_accounts_are_forbidden() {
    let app = test_app().await;
    let (_, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;

    register(&app, "stranger@example.com").await;
    let stranger = login(&app, "stranger@example.com").await;

    let (status, body) = get(&app, &format!("/restaurants/{restaurant_id}"), &stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = get(&app, "/restaurants/does-not-exist", &stranger).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_waiter_takes_orders_but_cannot_manage() {
    let app = test_app().await;
    let (owner, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;
    let (_, dish) = create_menu_item(&app, &owner, &restaurant_id, "Arepa", 8_000, &[]).await;

    let (status, _) = post(
        &app,
        &format!("/restaurants/{restaurant_id}/waiters"),
        &owner,
        json!({ "name": "Luis", "email": "luis@example.com", "password": "password-123" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let waiter = login(&app, "luis@example.com").await;

    let (status, order) = post(
        &app,
        &format!("/restaurants/{restaurant_id}/orders"),
        &waiter,
        json!({ "items": [{ "menuItemId": dish["id"], "quantity": 2 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["totalPrice"], 16_000);

    let (status, _) =
        create_menu_item(&app, &waiter, &restaurant_id, "Empanada", 3_000, &[]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Feature Limiter
// =============================================================================

#[tokio::test]
async fn test_free_tier_restaurant_and_menu_limits() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;

    let (status, body) = post(&app, "/restaurants", &token, json!({ "name": "Second" })).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "LIMIT_EXCEEDED");

    for n in 0..5 {
        let (status, body) =
            create_menu_item(&app, &token, &restaurant_id, &format!("Dish {n}"), 10_000, &[]).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
    let (status, body) =
        create_menu_item(&app, &token, &restaurant_id, "Dish 6", 10_000, &[]).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "LIMIT_EXCEEDED");

    let (_, usage) = get(
        &app,
        &format!("/subscription/usage?restaurantId={restaurant_id}"),
        &token,
    )
    .await;
    assert_eq!(usage["tier"], "free");
    let menu = usage["resources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["resource"] == "menu_items")
        .unwrap();
    assert_eq!(menu["count"], 5);
    assert_eq!(menu["limit"], 5);
}

#[tokio::test]
async fn test_free_tier_waiter_account_limit() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;
    let uri = format!("/restaurants/{restaurant_id}/waiters");
    let waiter = |n: usize| {
        json!({ "name": format!("Waiter {n}"), "email": format!("waiter{n}@example.com"), "password": "password-123" })
    };

    for n in 0..3 {
        let (status, body) = post(&app, &uri, &token, waiter(n)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = post(&app, &uri, &token, waiter(3)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "LIMIT_EXCEEDED");

    // The rejected account was never created
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "waiter3@example.com", "password": "password-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_free_tier_order_limit() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;
    let (_, dish) = create_menu_item(&app, &token, &restaurant_id, "Arepa", 8_000, &[]).await;
    let uri = format!("/restaurants/{restaurant_id}/orders");
    let order = json!({ "items": [{ "menuItemId": dish["id"], "quantity": 1 }] });

    for _ in 0..25 {
        let (status, body) = post(&app, &uri, &token, order.clone()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = post(&app, &uri, &token, order).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "LIMIT_EXCEEDED");
}

#[tokio::test]
async fn test_bulk_raw_ingredients_checked_as_a_whole() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;
    let uri = format!("/restaurants/{restaurant_id}/raw-ingredients/bulk");

    let batch = |n: usize, prefix: &str| -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({ "name": format!("{prefix} {i}"), "unit": "kg", "costPerUnit": 1_000 }))
                .collect(),
        )
    };

    let (status, body) = post(&app, &uri, &token, batch(20, "First")).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body.as_array().unwrap().len(), 20);

    let (status, _) = post(&app, &uri, &token, batch(6, "Too many")).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let (_, listed) = get(&app, &format!("/restaurants/{restaurant_id}/raw-ingredients"), &token).await;
    assert_eq!(listed.as_array().unwrap().len(), 20);

    let (status, _) = post(&app, &uri, &token, batch(5, "Fits")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_active_subscription_bypasses_limits() {
    let app = test_app().await;
    let (token, _) = owner_with_restaurant(&app, "owner@example.com").await;

    let (status, _) = get(&app, "/subscription", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, sub) = post(&app, "/subscription/activate", &token, json!({ "amount": 29_900 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["status"], "active");

    let (status, _) = post(&app, "/restaurants", &token, json!({ "name": "Second" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, sub) = send(&app, Method::POST, "/subscription/cancel", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["status"], "canceled");

    let (status, _) = post(&app, "/restaurants", &token, json!({ "name": "Third" })).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

// =============================================================================
// Orders and Cash Closing
// =============================================================================

#[tokio::test]
async fn test_order_status_transitions() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;
    let (_, dish) = create_menu_item(&app, &token, &restaurant_id, "Arepa", 8_000, &[]).await;

    let (_, order) = post(
        &app,
        &format!("/restaurants/{restaurant_id}/orders"),
        &token,
        json!({ "items": [{ "menuItemId": dish["id"], "quantity": 1 }] }),
    )
    .await;
    let status_uri = format!("/orders/{}/status", order["id"].as_str().unwrap());

    let (status, body) = put(&app, &status_uri, &token, json!({ "status": "paid" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");

    let (status, body) = put(&app, &status_uri, &token, json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = post(
        &app,
        &format!("/restaurants/{restaurant_id}/orders"),
        &token,
        json!({ "items": [{ "menuItemId": "missing", "quantity": 1 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_amounts_above_maximum_rejected() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;

    let (status, body) =
        create_menu_item(&app, &token, &restaurant_id, "Caviar", 10_000, &[i64::MAX / 2 + 1]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) =
        create_menu_item(&app, &token, &restaurant_id, "Caviar", MAX_AMOUNT + 1, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A full order at the maximum price still has a representable total
    let (status, dish) =
        create_menu_item(&app, &token, &restaurant_id, "Caviar", MAX_AMOUNT, &[MAX_AMOUNT]).await;
    assert_eq!(status, StatusCode::CREATED, "{dish}");
    let (status, order) = post(
        &app,
        &format!("/restaurants/{restaurant_id}/orders"),
        &token,
        json!({ "items": [{ "menuItemId": dish["id"], "quantity": 999 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["totalPrice"], MAX_AMOUNT * 999);
}

#[tokio::test]
async fn test_cash_closing_from_paid_orders() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;

    let (_, bandeja) =
        create_menu_item(&app, &token, &restaurant_id, "Bandeja", 25_000, &[9_000, 4_000]).await;
    let (_, jugo) = create_menu_item(&app, &token, &restaurant_id, "Jugo", 12_500, &[2_600]).await;

    let orders_uri = format!("/restaurants/{restaurant_id}/orders");
    let mut paid = Vec::new();
    for dish in [&bandeja, &jugo] {
        let (status, order) = post(
            &app,
            &orders_uri,
            &token,
            json!({ "items": [{ "menuItemId": dish["id"], "quantity": 2 }] }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        paid.push(order["id"].as_str().unwrap().to_string());
    }
    // Left pending: must not count.
    post(
        &app,
        &orders_uri,
        &token,
        json!({ "items": [{ "menuItemId": bandeja["id"], "quantity": 1 }] }),
    )
    .await;

    for id in &paid {
        let (status, _) = put(&app, &format!("/orders/{id}/status"), &token, json!({ "status": "paid" })).await;
        assert_eq!(status, StatusCode::OK);
    }

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let (status, preview) = get(
        &app,
        &format!("/restaurants/{restaurant_id}/cash-closings/preview?date={today}"),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["totalSales"], 75_000);
    assert_eq!(preview["totalRevenue"], 75_000);
    assert_eq!(preview["totalCosts"], 31_200);
    assert_eq!(preview["totalProfit"], 43_800);
    assert_eq!(preview["orderCount"], 2);
    assert_eq!(preview["averageOrderValue"], 37_500);

    let closings_uri = format!("/restaurants/{restaurant_id}/cash-closings");
    let closing_body = json!({
        "closingDate": today,
        "cashInRegister": 200_000,
        "cashWithdrawn": 50_000,
        "notes": "Friday"
    });
    let (status, closing) = post(&app, &closings_uri, &token, closing_body.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{closing}");
    assert_eq!(closing["totalProfit"], 43_800);
    assert_eq!(closing["cashWithdrawn"], 50_000);

    let (status, body) = post(&app, &closings_uri, &token, closing_body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = get(
        &app,
        &format!("/restaurants/{restaurant_id}/cash-closings/preview?date=yesterday"),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_day_closing_is_all_zero() {
    let app = test_app().await;
    let (token, restaurant_id) = owner_with_restaurant(&app, "owner@example.com").await;

    let (status, preview) = get(
        &app,
        &format!("/restaurants/{restaurant_id}/cash-closings/preview?date=2025-08-15"),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["orderCount"], 0);
    assert_eq!(preview["totalSales"], 0);
    assert_eq!(preview["averageOrderValue"], 0);
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], true);
    assert_eq!(body["schemaCurrent"], true);
    assert_eq!(body["status"], "ok");
}
