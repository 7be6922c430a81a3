//! # HTTP Routes
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  public        /health  /auth/register  /auth/login                     │
//! │                                                                         │
//! │  bearer token  /auth/me  /auth/password  /subscription/*                │
//! │                /restaurants[/{id}]                                      │
//! │                /restaurants/{id}/menu-items | tables | orders           │
//! │                                  inventory | raw-ingredients[/bulk]     │
//! │                                  waiters | cash-closings[/preview]      │
//! │                /menu-items/{id}  /tables/{id}  /orders/{id}[/status]    │
//! │                /inventory/{id}  /raw-ingredients/{id}                   │
//! │                /cash-closings/{id}                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every protected handler takes a [`Caller`](crate::extract::Caller); the
//! extractor rejects before the handler body runs.

use axum::Router;

use crate::state::AppState;

mod auth;
mod cash_closings;
mod health;
mod inventory;
mod menu_items;
mod orders;
mod raw_ingredients;
mod restaurants;
mod subscription;
mod tables;
mod waiters;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(subscription::routes())
        .merge(restaurants::routes())
        .merge(menu_items::routes())
        .merge(tables::routes())
        .merge(orders::routes())
        .merge(inventory::routes())
        .merge(raw_ingredients::routes())
        .merge(waiters::routes())
        .merge(cash_closings::routes())
}
