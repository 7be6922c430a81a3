//! # Menu Item Repository
//!
//! Menu items store their recipe as a JSON array in the `ingredients` column;
//! the cash-closing aggregator reads it back to price each sold portion.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{Ingredient, Money, MenuItem};

const MENU_ITEM_COLUMNS: &str = "id, restaurant_id, name, description, price, category, \
                                 is_available, ingredients, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category: Option<String>,
    pub is_available: bool,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone)]
pub struct MenuItemRepository {
    pool: SqlitePool,
}

impl MenuItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuItemRepository { pool }
    }

    pub async fn create(&self, new: NewMenuItem) -> DbResult<MenuItem> {
        let now = Utc::now();
        let item = MenuItem {
            id: new_id(),
            restaurant_id: new.restaurant_id,
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            is_available: new.is_available,
            ingredients: new.ingredients,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, restaurant_id = %item.restaurant_id, "Inserting menu item");

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, restaurant_id, name, description, price, category,
                is_available, ingredients, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.restaurant_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.category)
        .bind(item.is_available)
        .bind(Json(&item.ingredients))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Menu of a restaurant, grouped by category then name.
    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items \
             WHERE restaurant_id = ?1 ORDER BY category, name"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn update(&self, item: &MenuItem) -> DbResult<MenuItem> {
        debug!(id = %item.id, "Updating menu item");

        let mut updated = item.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE menu_items SET
                name = ?2,
                description = ?3,
                price = ?4,
                category = ?5,
                is_available = ?6,
                ingredients = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.price)
        .bind(&updated.category)
        .bind(updated.is_available)
        .bind(Json(&updated.ingredients))
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", &item.id));
        }

        Ok(updated)
    }

    /// Hard delete. Past order lines keep their menu item id; the aggregator
    /// treats those lines as having no ingredient cost.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting menu item");

        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        Ok(())
    }

    pub async fn count_by_restaurant(&self, restaurant_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM menu_items WHERE restaurant_id = ?1")
                .bind(restaurant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
