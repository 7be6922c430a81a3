//! Restaurant CRUD. Only owners create, edit or delete; staff can read the
//! restaurant they are attached to.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use mesa_core::validation::validate_name;
use mesa_core::Restaurant;
use mesa_db::NewRestaurant;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, Caller};
use crate::services::{access, FeatureLimiter, Quota};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RestaurantRequest {
    name: String,
    address: Option<String>,
    phone: Option<String>,
    description: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_restaurants).post(create_restaurant))
        .route(
            "/restaurants/{id}",
            get(get_restaurant)
                .put(update_restaurant)
                .delete(delete_restaurant),
        )
}

async fn create_restaurant(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<RestaurantRequest>,
) -> ApiResult<(StatusCode, Json<Restaurant>)> {
    let name = validate_name("name", &request.name)?;

    FeatureLimiter::new(state.db.clone())
        .ensure_can_create(
            &caller.user_id,
            Quota::Restaurants {
                owner_id: &caller.user_id,
            },
            1,
        )
        .await?;

    let restaurant = state
        .db
        .restaurants()
        .create(NewRestaurant {
            owner_id: caller.user_id.clone(),
            name,
            address: request.address,
            phone: request.phone,
            description: request.description,
        })
        .await?;

    info!(restaurant_id = %restaurant.id, owner_id = %caller.user_id, "Restaurant created");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

async fn list_restaurants(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Restaurant>>> {
    Ok(Json(
        state.db.restaurants().list_by_owner(&caller.user_id).await?,
    ))
}

async fn get_restaurant(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Restaurant>> {
    Ok(Json(access::require_member(&state.db, &caller, &id).await?))
}

async fn update_restaurant(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<RestaurantRequest>,
) -> ApiResult<Json<Restaurant>> {
    let mut restaurant = access::require_owner(&state.db, &caller, &id).await?;
    restaurant.name = validate_name("name", &request.name)?;
    restaurant.address = request.address;
    restaurant.phone = request.phone;
    restaurant.description = request.description;

    Ok(Json(state.db.restaurants().update(&restaurant).await?))
}

async fn delete_restaurant(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    access::require_owner(&state.db, &caller, &id).await?;
    state.db.restaurants().delete(&id).await?;

    info!(restaurant_id = %id, "Restaurant deleted");
    Ok(StatusCode::NO_CONTENT)
}
