//! Stock on hand. Any member of the restaurant may adjust it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use mesa_core::validation::{validate_name, validate_stock, validate_unit};
use mesa_core::InventoryItem;
use mesa_db::NewInventoryItem;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, Caller};
use crate::services::access;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryRequest {
    name: String,
    quantity: f64,
    unit: String,
    #[serde(default)]
    min_stock: f64,
}

impl InventoryRequest {
    /// Trimmed name and unit.
    fn validate(&self) -> ApiResult<(String, String)> {
        validate_stock("quantity", self.quantity)?;
        validate_stock("minStock", self.min_stock)?;
        Ok((validate_name("name", &self.name)?, validate_unit(&self.unit)?))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/{id}/inventory",
            get(list_inventory).post(create_inventory_item),
        )
        .route(
            "/inventory/{id}",
            put(update_inventory_item).delete(delete_inventory_item),
        )
}

async fn create_inventory_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(request): ApiJson<InventoryRequest>,
) -> ApiResult<(StatusCode, Json<InventoryItem>)> {
    let restaurant = access::require_member(&state.db, &caller, &restaurant_id).await?;
    let (name, unit) = request.validate()?;

    let item = state
        .db
        .inventory()
        .create(NewInventoryItem {
            restaurant_id: restaurant.id,
            name,
            quantity: request.quantity,
            unit,
            min_stock: request.min_stock,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_inventory(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        state.db.inventory().list_by_restaurant(&restaurant_id).await?,
    ))
}

async fn update_inventory_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<InventoryRequest>,
) -> ApiResult<Json<InventoryItem>> {
    let mut item = state
        .db
        .inventory()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("InventoryItem", &id))?;
    access::require_member(&state.db, &caller, &item.restaurant_id).await?;

    let (name, unit) = request.validate()?;
    item.name = name;
    item.unit = unit;
    item.quantity = request.quantity;
    item.min_stock = request.min_stock;

    Ok(Json(state.db.inventory().update(&item).await?))
}

async fn delete_inventory_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let item = state
        .db
        .inventory()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("InventoryItem", &id))?;
    access::require_member(&state.db, &caller, &item.restaurant_id).await?;

    state.db.inventory().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
