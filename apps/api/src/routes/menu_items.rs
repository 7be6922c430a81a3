//! Menu items and their recipe ingredients.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use mesa_core::validation::{validate_amount, validate_name, validate_stock, validate_unit};
use mesa_core::{Ingredient, MenuItem, Money};
use mesa_db::{Database, NewMenuItem};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, Caller};
use crate::services::{access, FeatureLimiter, Quota};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuItemRequest {
    name: String,
    description: Option<String>,
    price: Money,
    category: Option<String>,
    #[serde(default = "available_by_default")]
    is_available: bool,
    #[serde(default)]
    ingredients: Vec<Ingredient>,
}

fn available_by_default() -> bool {
    true
}

/// Checked fields of a menu item request.
struct ValidMenuItem {
    name: String,
    ingredients: Vec<Ingredient>,
}

fn validate(request: &MenuItemRequest) -> ApiResult<ValidMenuItem> {
    let name = validate_name("name", &request.name)?;
    validate_amount("price", request.price.minor())?;

    let mut ingredients = Vec::with_capacity(request.ingredients.len());
    for ingredient in &request.ingredients {
        validate_stock("ingredient quantity", ingredient.quantity)?;
        validate_amount("ingredient price", ingredient.price.minor())?;
        ingredients.push(Ingredient {
            name: validate_name("ingredient name", &ingredient.name)?,
            quantity: ingredient.quantity,
            unit: validate_unit(&ingredient.unit)?,
            price: ingredient.price,
        });
    }

    Ok(ValidMenuItem { name, ingredients })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/{id}/menu-items",
            get(list_menu_items).post(create_menu_item),
        )
        .route(
            "/menu-items/{id}",
            get(get_menu_item).put(update_menu_item).delete(delete_menu_item),
        )
}

async fn load_menu_item(db: &Database, id: &str) -> ApiResult<MenuItem> {
    db.menu_items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("MenuItem", id))
}

async fn create_menu_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(request): ApiJson<MenuItemRequest>,
) -> ApiResult<(StatusCode, Json<MenuItem>)> {
    let restaurant = access::require_owner(&state.db, &caller, &restaurant_id).await?;
    let valid = validate(&request)?;

    FeatureLimiter::new(state.db.clone())
        .ensure_can_create(
            &restaurant.owner_id,
            Quota::MenuItems {
                restaurant_id: &restaurant.id,
            },
            1,
        )
        .await?;

    let item = state
        .db
        .menu_items()
        .create(NewMenuItem {
            restaurant_id: restaurant.id,
            name: valid.name,
            description: request.description,
            price: request.price,
            category: request.category,
            is_available: request.is_available,
            ingredients: valid.ingredients,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_menu_items(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
) -> ApiResult<Json<Vec<MenuItem>>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        state.db.menu_items().list_by_restaurant(&restaurant_id).await?,
    ))
}

async fn get_menu_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<MenuItem>> {
    let item = load_menu_item(&state.db, &id).await?;
    access::require_member(&state.db, &caller, &item.restaurant_id).await?;
    Ok(Json(item))
}

async fn update_menu_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<MenuItemRequest>,
) -> ApiResult<Json<MenuItem>> {
    let mut item = load_menu_item(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &item.restaurant_id).await?;
    let valid = validate(&request)?;

    item.name = valid.name;
    item.description = request.description;
    item.price = request.price;
    item.category = request.category;
    item.is_available = request.is_available;
    item.ingredients = valid.ingredients;

    Ok(Json(state.db.menu_items().update(&item).await?))
}

async fn delete_menu_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let item = load_menu_item(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &item.restaurant_id).await?;
    state.db.menu_items().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
