//! # Request Extractors
//!
//! [`Caller`] turns a bearer token into an account id before the handler
//! runs. [`ApiJson`], [`ApiQuery`] and [`ApiPath`] wrap axum's extractors so malformed
//! input is answered in the same `{ "code", "message" }` shape as every
//! other error.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated account behind a request.
///
/// ## Extraction
/// ```text
/// Authorization header ── missing / not "Bearer <token>" ──► 401
///        │
///        ▼
/// JwtManager::verify_token ── bad signature / expired ──► 401
///        │
///        ▼
/// Caller { user_id: claims.sub }
/// ```
///
/// Never touches the database; a token for a deleted account still yields
/// a caller, and the handler's lookups answer 404.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthenticated("Missing authorization header"))?;

        let header = header
            .to_str()
            .map_err(|_| ApiError::unauthenticated("Malformed authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthenticated("Malformed authorization header"))?;

        let claims = state.jwt.verify_token(token)?;

        Ok(Caller {
            user_id: claims.sub,
        })
    }
}

/// JSON body extractor with [`ApiError`] rejections.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
