//! # Restaurant Access
//!
//! ```text
//! caller ──► restaurant.owner_id == caller?        ──yes──► owner
//!              │ no
//!              ▼
//!            caller.restaurant_id == restaurant.id? ──yes──► staff
//!              │ no
//!              ▼
//!            403 FORBIDDEN
//! ```
//!
//! Owners manage; staff (waiters attached to the restaurant) read and take
//! orders.

use tracing::warn;

use mesa_core::Restaurant;
use mesa_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::extract::Caller;

pub async fn load_restaurant(db: &Database, restaurant_id: &str) -> ApiResult<Restaurant> {
    db.restaurants()
        .get_by_id(restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant", restaurant_id))
}

/// Owner or attached staff.
pub async fn require_member(
    db: &Database,
    caller: &Caller,
    restaurant_id: &str,
) -> ApiResult<Restaurant> {
    let restaurant = load_restaurant(db, restaurant_id).await?;
    if restaurant.owner_id == caller.user_id {
        return Ok(restaurant);
    }

    let attached = db
        .users()
        .get_by_id(&caller.user_id)
        .await?
        .and_then(|user| user.restaurant_id)
        .is_some_and(|id| id == restaurant.id);

    if attached {
        Ok(restaurant)
    } else {
        warn!(user_id = %caller.user_id, restaurant_id = %restaurant_id, "Restaurant access denied");
        Err(ApiError::forbidden("No access to this restaurant"))
    }
}

pub async fn require_owner(
    db: &Database,
    caller: &Caller,
    restaurant_id: &str,
) -> ApiResult<Restaurant> {
    let restaurant = load_restaurant(db, restaurant_id).await?;
    if restaurant.owner_id != caller.user_id {
        warn!(user_id = %caller.user_id, restaurant_id = %restaurant_id, "Owner-only action denied");
        return Err(ApiError::forbidden("Only the restaurant owner can do this"));
    }
    Ok(restaurant)
}
