//! Shared application state handed to every handler.

use std::sync::Arc;

use mesa_db::Database;

use crate::auth::JwtManager;

/// Everything a request may need beyond its own input: the connection pool
/// and the key material. Both are immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }
}
