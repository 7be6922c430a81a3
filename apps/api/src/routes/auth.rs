//! Registration, login and the caller's own account.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mesa_core::User;

use crate::error::ApiResult;
use crate::extract::{ApiJson, Caller};
use crate::services::accounts::{self, NewAccount};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: User,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(account): ApiJson<NewAccount>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let user = accounts::register(&state.db, account).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: user.id })))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = accounts::login(&state.db, &request.email, &request.password).await?;
    let token = state.jwt.issue_token(&user.id)?;
    Ok(Json(LoginResponse { token, user }))
}

async fn me(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<User>> {
    Ok(Json(accounts::get_account(&state.db, &caller.user_id).await?))
}

async fn change_password(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    accounts::change_password(
        &state.db,
        &caller.user_id,
        &request.current_password,
        &request.new_password,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
