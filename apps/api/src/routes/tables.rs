use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use mesa_core::validation::validate_positive;
use mesa_core::{Table, TableStatus};
use mesa_db::{Database, NewTable};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, Caller};
use crate::services::access;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct TableRequest {
    number: i64,
    capacity: i64,
    #[serde(default)]
    status: TableStatus,
}

impl TableRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_positive("number", self.number)?;
        validate_positive("capacity", self.capacity)?;
        Ok(())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/{id}/tables",
            get(list_tables).post(create_table),
        )
        .route(
            "/tables/{id}",
            get(get_table).put(update_table).delete(delete_table),
        )
}

async fn load_table(db: &Database, id: &str) -> ApiResult<Table> {
    db.tables()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Table", id))
}

async fn create_table(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
    ApiJson(request): ApiJson<TableRequest>,
) -> ApiResult<(StatusCode, Json<Table>)> {
    let restaurant = access::require_owner(&state.db, &caller, &restaurant_id).await?;
    request.validate()?;

    let table = state
        .db
        .tables()
        .create(NewTable {
            restaurant_id: restaurant.id,
            number: request.number,
            capacity: request.capacity,
            status: request.status,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(table)))
}

async fn list_tables(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(restaurant_id): ApiPath<String>,
) -> ApiResult<Json<Vec<Table>>> {
    access::require_member(&state.db, &caller, &restaurant_id).await?;
    Ok(Json(state.db.tables().list_by_restaurant(&restaurant_id).await?))
}

async fn get_table(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Table>> {
    let table = load_table(&state.db, &id).await?;
    access::require_member(&state.db, &caller, &table.restaurant_id).await?;
    Ok(Json(table))
}

async fn update_table(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<TableRequest>,
) -> ApiResult<Json<Table>> {
    let mut table = load_table(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &table.restaurant_id).await?;
    request.validate()?;

    table.number = request.number;
    table.capacity = request.capacity;
    table.status = request.status;

    Ok(Json(state.db.tables().update(&table).await?))
}

async fn delete_table(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let table = load_table(&state.db, &id).await?;
    access::require_owner(&state.db, &caller, &table.restaurant_id).await?;
    state.db.tables().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
