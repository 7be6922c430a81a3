//! # Repository Module
//!
//! One repository per aggregate. Each wraps a clone of the pool and issues
//! single-entity queries; the only multi-row writes are order creation
//! (order + lines) and bulk raw-ingredient inserts, both in a transaction.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler / service                                                      │
//! │       │                                                                 │
//! │       │  db.menu_items().count_by_restaurant(&restaurant_id)           │
//! │       ▼                                                                 │
//! │  MenuItemRepository                                                    │
//! │  ├── create(NewMenuItem)      → MenuItem   (id + timestamps assigned)  │
//! │  ├── get_by_id(id)            → Option<MenuItem>                       │
//! │  ├── list_by_restaurant(id)   → Vec<MenuItem>                          │
//! │  ├── update(&MenuItem)        → MenuItem   (updated_at refreshed)      │
//! │  ├── delete(id)               → ()         (NotFound if missing)       │
//! │  └── count_by_restaurant(id)  → i64        (feature limiter)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts and waiter staff
//! - [`RestaurantRepository`] - Restaurants per owner
//! - [`MenuItemRepository`] - Menu items with JSON ingredient lists
//! - [`TableRepository`] - Dining tables
//! - [`OrderRepository`] - Orders and their lines
//! - [`InventoryRepository`] - Stock items
//! - [`RawIngredientRepository`] - Purchasable ingredients
//! - [`CashClosingRepository`] - End-of-day closings
//! - [`SubscriptionRepository`] - One subscription per account

pub mod cash_closing;
pub mod inventory;
pub mod menu_item;
pub mod order;
pub mod raw_ingredient;
pub mod restaurant;
pub mod subscription;
pub mod table;
pub mod user;

pub use cash_closing::{CashClosingRepository, NewCashClosing};
pub use inventory::{InventoryRepository, NewInventoryItem};
pub use menu_item::{MenuItemRepository, NewMenuItem};
pub use order::{NewOrder, NewOrderItem, OrderRepository};
pub use raw_ingredient::{NewRawIngredient, RawIngredientRepository};
pub use restaurant::{NewRestaurant, RestaurantRepository};
pub use subscription::SubscriptionRepository;
pub use table::{NewTable, TableRepository};
pub use user::{NewUser, UserRepository};

use uuid::Uuid;

/// Generates a new entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use mesa_core::{Restaurant, User, UserRole};

    use super::{NewRestaurant, NewUser};
    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, email: &str) -> User {
        db.users()
            .create(NewUser {
                name: "Owner".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Admin,
                phone: None,
                restaurant_id: None,
            })
            .await
            .unwrap()
    }

    /// An owner account with one restaurant.
    pub async fn restaurant(db: &Database) -> (User, Restaurant) {
        let owner = user(db, &format!("{}@example.com", super::new_id())).await;
        let restaurant = db
            .restaurants()
            .create(NewRestaurant {
                owner_id: owner.id.clone(),
                name: "La Mesa".to_string(),
                address: None,
                phone: None,
                description: None,
            })
            .await
            .unwrap();
        (owner, restaurant)
    }
}
