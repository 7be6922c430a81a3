//! # Orders
//!
//! Staff and owners take orders; only owners delete them.
//!
//! ## Creation
//! ```text
//! items ──► 1..=100 lines, quantity 1..=999
//!   │
//!   ▼
//! menu item exists in this restaurant? ── no ──► 400
//!   │ and is available?                ── no ──► 400
//!   ▼
//! free tier: fewer than 25 orders?     ── no ──► 402
//!   │
//!   ▼
//! insert order + lines (unit price snapshot), status pending
//! ```

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use mesa_core::validation::{validate_order_size, validate_quantity, validate_uuid};
use mesa_core::{CoreError, MenuItem, Order, OrderStatus, OrderWithItems};
use mesa_db::{Database, NewOrder, NewOrderItem};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery, Caller};
use crate::services::{access, FeatureLimiter, Quota};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderLineRequest {
    menu_item_id: String,
    quantity: i64,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest {
    table_id: Option<String>,
    notes: Option<String>,
    items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
struct OrderListQuery {
    status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: OrderStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/{id}/orders",
            get(list_orders).post(create_order),
        )
        .route("/orders/{id}", get(get_order).delete(delete_order))
        .route("/orders/{id}/status", put(update_status))
}

async fn load_order(db: &Database, id: &str) -> ApiResult<Order> {
    db.orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))
}

/// Resolves each line against the restaurant's menu, snapshotting the price.
fn build_lines(
    lines: Vec<OrderLineRequest>,
    menu: &HashMap<String, MenuItem>,
) -> ApiResult<Vec<NewOrderItem>> {
    validate_order_size(lines.len())?;

    lines
        .into_iter()
        .map(|line| {
            validate_quantity(line.quantity)?;
            let item = menu
                .get(&line.menu_item_id)
                .ok_or_else(|| CoreError::MenuItemNotFound(line.menu_item_id.clone()))?;
            if !item.is_available {
                return Err(ApiError::invalid_input(format!(
                    "Menu item is not available: {}",
                    item.name
                )));
            }
            Ok(NewOrderItem {
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                unit_price: item.price,
                notes: line.notes,
            })
        })
        .collect()
}

async fn create_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    let restaurant = access::require_member(&state.db, &caller, &restaurant_id).await?;

    let menu: HashMap<String, MenuItem> = state
        .db
        .menu_items()
        .list_by_restaurant(&restaurant.id)
        .await?
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();
    let items = build_lines(request.items, &menu)?;

    if let Some(table_id) = &request.table_id {
        validate_uuid(table_id)?;
        let belongs = state
            .db
            .tables()
            .get_by_id(table_id)
            .await?
            .is_some_and(|t| t.restaurant_id == restaurant.id);
        if !belongs {
            return Err(ApiError::not_found("Table", table_id));
        }
    }

    FeatureLimiter::new(state.db.clone())
        .ensure_can_create(
            &restaurant.owner_id,
            Quota::Orders {
                restaurant_id: &restaurant.id,
            },
            1,
        )
        .await?;

    let order = state
        .db
        .orders()
        .create(NewOrder {
            restaurant_id: restaurant.id,
            table_id: request.table_id,
            waiter_id: Some(caller.user_id),
            notes: request.notes,
            items,
        })
        .await?;

    info!(
        order_id = %order.order.id,
        lines = order.items.len(),
        total = %order.order.total_price,
        "Order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        state
            .db
            .orders()
            .list_by_restaurant(&restaurant_id, query.status)
            .await?,
    ))
}

async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<OrderWithItems>> {
    let order = state
        .db
        .orders()
        .get_with_items(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &id))?;
    access::require_member(&state.db, &caller, &order.order.restaurant_id).await?;
    Ok(Json(order))
}

async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Json<Order>> {
    let order = load_order(&state.db, &id).await?;
    access::require_member(&state.db, &caller, &order.restaurant_id).await?;

    if !order.status.can_transition_to(request.status) {
        return Err(CoreError::InvalidOrderTransition {
            order_id: order.id,
            current_status: order.status.as_str().to_string(),
            requested: request.status.as_str().to_string(),
        }
        .into());
    }

    let updated = state.db.orders().update_status(&id, request.status).await?;
    info!(order_id = %id, from = order.status.as_str(), to = updated.status.as_str(), "Order status changed");
    Ok(Json(updated))
}

async fn delete_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let order = load_order(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &order.restaurant_id).await?;
    state.db.orders().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
