//! # Mesa API
//!
//! HTTP server for the Mesa restaurant management backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Mesa API                                      │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth          │  │  Restaurants   │  │  Cash Closings             ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • menu items   │  │ • create / update          ││
//! │  │ • login (JWT)  │  │ • tables       │  │ • preview                  ││
//! │  │ • me/password  │  │ • orders       │  │                            ││
//! │  └────────────────┘  │ • inventory    │  └────────────────────────────┘│
//! │                      │ • raw ingr.    │                                │
//! │  ┌────────────────┐  │ • waiters      │  ┌────────────────────────────┐│
//! │  │  Subscription  │  └────────────────┘  │  Feature Limiter           ││
//! │  │ • activate     │                      │  free tier thresholds      ││
//! │  │ • cancel/usage │                      │  (HTTP 402 when reached)   ││
//! │  └────────────────┘                      └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │   mesa-db (SQLite pool)      RS256 key pair      argon2 hashing   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ServerConfig`]. Environment variables:
//! - `MESA_HTTP_ADDR` - listen address (default: 0.0.0.0:8080)
//! - `MESA_DATABASE_PATH` - SQLite file (default: mesa.db)
//! - `MESA_JWT_PRIVATE_KEY_PATH` / `MESA_JWT_PUBLIC_KEY_PATH` - RSA PEM files
//! - `MESA_JWT_LIFETIME_HOURS` - token lifetime (default: 36)
//! - `MESA_MAX_CONNECTIONS` - pool size (default: 5)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod password;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::JwtManager;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application: every route, request tracing and state.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
