//! The caller's plan. Activation stands in for a payment provider callback:
//! it opens a 30-day active period.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;

use mesa_core::validation::validate_amount;
use mesa_core::{Money, Subscription, SubscriptionStatus, SUBSCRIPTION_PERIOD_DAYS};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery, Caller};
use crate::services::access;
use crate::services::{FeatureLimiter, UsageReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ActivateRequest {
    amount: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageQuery {
    restaurant_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/subscription/activate", post(activate))
        .route("/subscription/cancel", post(cancel))
        .route("/subscription/usage", get(usage))
}

async fn get_subscription(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Subscription>> {
    state
        .db
        .subscriptions()
        .get_by_user(&caller.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Subscription", &caller.user_id))
}

async fn activate(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<ActivateRequest>,
) -> ApiResult<Json<Subscription>> {
    validate_amount("amount", request.amount.minor())?;

    let now = Utc::now();
    let subscription = state
        .db
        .subscriptions()
        .upsert(
            &caller.user_id,
            SubscriptionStatus::Active,
            now,
            now + Duration::days(SUBSCRIPTION_PERIOD_DAYS),
            request.amount,
        )
        .await?;

    info!(user_id = %caller.user_id, until = %subscription.current_period_end, "Subscription activated");
    Ok(Json(subscription))
}

async fn cancel(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Subscription>> {
    let subscription = state
        .db
        .subscriptions()
        .set_status(&caller.user_id, SubscriptionStatus::Canceled)
        .await?;

    info!(user_id = %caller.user_id, "Subscription canceled");
    Ok(Json(subscription))
}

async fn usage(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<UsageQuery>,
) -> ApiResult<Json<UsageReport>> {
    if let Some(restaurant_id) = &query.restaurant_id {
        access::require_owner(&state.db, &caller, restaurant_id).await?;
    }

    let report = FeatureLimiter::new(state.db.clone())
        .usage(
            &caller.user_id,
            query.restaurant_id.as_deref(),
            Utc::now().date_naive(),
        )
        .await?;
    Ok(Json(report))
}
