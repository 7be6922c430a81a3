//! Liveness for load balancers: database round trip and schema version.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: bool,
    schema_current: bool,
    version: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let schema_current = match state.db.migration_status().await {
        Ok((embedded, applied)) => applied >= embedded,
        Err(e) => {
            warn!(error = %e, "Migration status unavailable");
            false
        }
    };

    let healthy = database && schema_current;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            database,
            schema_current,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
