//! Waiter accounts attached to a restaurant. Owner only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use mesa_core::{User, UserRole};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, Caller};
use crate::services::accounts::{self, NewAccount};
use crate::services::{access, FeatureLimiter, Quota};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/restaurants/{id}/waiters",
        get(list_waiters).post(create_waiter),
    )
}

async fn create_waiter(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(account): ApiJson<NewAccount>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let restaurant = access::require_owner(&state.db, &caller, &restaurant_id).await?;

    FeatureLimiter::new(state.db.clone())
        .ensure_can_create(
            &restaurant.owner_id,
            Quota::WaiterAccounts {
                restaurant_id: &restaurant.id,
            },
            1,
        )
        .await?;

    let waiter = accounts::create_waiter(&state.db, &restaurant, account).await?;
    Ok((StatusCode::CREATED, Json(waiter)))
}

async fn list_waiters(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
) -> ApiResult<Json<Vec<User>>> {
    access::require_owner(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        state
            .db
            .users()
            .list_by_restaurant_role(&restaurant_id, UserRole::Waiter)
            .await?,
    ))
}
