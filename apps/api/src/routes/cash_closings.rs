//! Daily cash closings. Owners write; staff may read.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use mesa_core::{CashClosing, CashClosingTotals};
use mesa_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery, Caller};
use crate::services::access;
use crate::services::cash_closing::{self, ClosingUpdateRequest, NewClosingRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    date: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/{id}/cash-closings",
            get(list_closings).post(create_closing),
        )
        .route(
            "/restaurants/{id}/cash-closings/preview",
            get(preview_closing),
        )
        .route(
            "/cash-closings/{id}",
            get(get_closing).put(update_closing).delete(delete_closing),
        )
}

async fn load_closing(db: &Database, id: &str) -> ApiResult<CashClosing> {
    db.cash_closings()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("CashClosing", id))
}

async fn create_closing(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(request): ApiJson<NewClosingRequest>,
) -> ApiResult<(StatusCode, Json<CashClosing>)> {
    let restaurant = access::require_owner(&state.db, &caller, &restaurant_id).await?;
    let closing = cash_closing::create(&state.db, &restaurant, request).await?;
    Ok((StatusCode::CREATED, Json(closing)))
}

async fn list_closings(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
) -> ApiResult<Json<Vec<CashClosing>>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        state
            .db
            .cash_closings()
            .list_by_restaurant(&restaurant_id)
            .await?,
    ))
}

async fn preview_closing(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<PreviewQuery>,
) -> ApiResult<Json<CashClosingTotals>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        cash_closing::preview(&state.db, &restaurant_id, &query.date).await?,
    ))
}

async fn get_closing(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<CashClosing>> {
    let closing = load_closing(&state.db, &id).await?;
    access::require_member(&state.db, &caller, &closing.restaurant_id).await?;
    Ok(Json(closing))
}

async fn update_closing(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ClosingUpdateRequest>,
) -> ApiResult<Json<CashClosing>> {
    let closing = load_closing(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &closing.restaurant_id).await?;
    Ok(Json(cash_closing::update(&state.db, closing, request).await?))
}

async fn delete_closing(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let closing = load_closing(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &closing.restaurant_id).await?;
    state.db.cash_closings().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
