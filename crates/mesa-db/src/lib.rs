//! # mesa-db: Database Layer for Mesa
//!
//! SQLite persistence for every Mesa aggregate, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Mesa Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /restaurants/:id/cash-closings)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mesa-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                  │  │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepository   │  │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepository  │  │ 0001_initial │  │   │
//! │  │   │               │    │ CashClosingRepo  │  │ _schema.sql  │  │   │
//! │  │   └───────────────┘    │ ...              │  └──────────────┘  │   │
//! │  │                        └──────────────────┘                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (database_path) or :memory: in tests                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("mesa.db")).await?;
//! let menu = db.menu_items().list_by_restaurant(&restaurant_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    CashClosingRepository, InventoryRepository, MenuItemRepository, NewCashClosing,
    NewInventoryItem, NewMenuItem, NewOrder, NewOrderItem, NewRawIngredient, NewRestaurant,
    NewTable, NewUser, OrderRepository, RawIngredientRepository, RestaurantRepository,
    SubscriptionRepository, TableRepository, UserRepository,
};
