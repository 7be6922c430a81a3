//! Raw ingredients, single and bulk. A bulk insert is checked against the
//! free-tier limit as a whole: `existing + n <= 25`, else nothing is stored.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use mesa_core::validation::{validate_amount, validate_name, validate_stock, validate_unit};
use mesa_core::{Money, RawIngredient};
use mesa_db::{Database, NewRawIngredient};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, Caller};
use crate::services::{access, FeatureLimiter, Quota};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngredientRequest {
    name: String,
    unit: String,
    cost_per_unit: Money,
    #[serde(default)]
    stock: f64,
}

impl RawIngredientRequest {
    fn into_new(self, restaurant_id: &str) -> ApiResult<NewRawIngredient> {
        validate_amount("costPerUnit", self.cost_per_unit.minor())?;
        validate_stock("stock", self.stock)?;
        Ok(NewRawIngredient {
            restaurant_id: restaurant_id.to_string(),
            name: validate_name("name", &self.name)?,
            unit: validate_unit(&self.unit)?,
            cost_per_unit: self.cost_per_unit,
            stock: self.stock,
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/{id}/raw-ingredients",
            get(list_raw_ingredients).post(create_raw_ingredient),
        )
        .route(
            "/restaurants/{id}/raw-ingredients/bulk",
            post(create_raw_ingredients_bulk),
        )
        .route(
            "/raw-ingredients/{id}",
            put(update_raw_ingredient).delete(delete_raw_ingredient),
        )
}

async fn load_raw_ingredient(db: &Database, id: &str) -> ApiResult<RawIngredient> {
    db.raw_ingredients()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("RawIngredient", id))
}

async fn create_raw_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(request): ApiJson<RawIngredientRequest>,
) -> ApiResult<(StatusCode, Json<RawIngredient>)> {
    let restaurant = access::require_owner(&state.db, &caller, &restaurant_id).await?;
    let new = request.into_new(&restaurant.id)?;

    FeatureLimiter::new(state.db.clone())
        .ensure_can_create(
            &restaurant.owner_id,
            Quota::RawIngredients {
                restaurant_id: &restaurant.id,
            },
            1,
        )
        .await?;

    let row = state.db.raw_ingredients().create(new).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn create_raw_ingredients_bulk(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(requests): ApiJson<Vec<RawIngredientRequest>>,
) -> ApiResult<(StatusCode, Json<Vec<RawIngredient>>)> {
    let restaurant = access::require_owner(&state.db, &caller, &restaurant_id).await?;
    if requests.is_empty() {
        return Err(ApiError::invalid_input("At least one raw ingredient is required"));
    }

    let new = requests
        .into_iter()
        .map(|r| r.into_new(&restaurant.id))
        .collect::<ApiResult<Vec<_>>>()?;

    let extra = i64::try_from(new.len()).unwrap_or(i64::MAX);
    FeatureLimiter::new(state.db.clone())
        .ensure_can_create(
            &restaurant.owner_id,
            Quota::RawIngredients {
                restaurant_id: &restaurant.id,
            },
            extra,
        )
        .await?;

    let rows = state.db.raw_ingredients().create_many(new).await?;
    info!(restaurant_id = %restaurant.id, count = rows.len(), "Raw ingredients imported");
    Ok((StatusCode::CREATED, Json(rows)))
}

async fn list_raw_ingredients(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
) -> ApiResult<Json<Vec<RawIngredient>>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(
        state
            .db
            .raw_ingredients()
            .list_by_restaurant(&restaurant_id)
            .await?,
    ))
}

async fn update_raw_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<RawIngredientRequest>,
) -> ApiResult<Json<RawIngredient>> {
    let mut row = load_raw_ingredient(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &row.restaurant_id).await?;

    let new = request.into_new(&row.restaurant_id)?;
    row.name = new.name;
    row.unit = new.unit;
    row.cost_per_unit = new.cost_per_unit;
    row.stock = new.stock;

    Ok(Json(state.db.raw_ingredients().update(&row).await?))
}

async fn delete_raw_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let row = load_raw_ingredient(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &row.restaurant_id).await?;
    state.db.raw_ingredients().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
