//! # Inventory Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::InventoryItem;

const INVENTORY_COLUMNS: &str =
    "id, restaurant_id, name, quantity, unit, min_stock, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub restaurant_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub min_stock: f64,
}

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    pub async fn create(&self, new: NewInventoryItem) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem {
            id: new_id(),
            restaurant_id: new.restaurant_id,
            name: new.name,
            quantity: new.quantity,
            unit: new.unit,
            min_stock: new.min_stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Inserting inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, restaurant_id, name, quantity, unit, min_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.restaurant_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.min_stock)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_items WHERE restaurant_id = ?1 ORDER BY name"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn update(&self, item: &InventoryItem) -> DbResult<InventoryItem> {
        debug!(id = %item.id, quantity = item.quantity, "Updating inventory item");

        let mut updated = item.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = ?2,
                quantity = ?3,
                unit = ?4,
                min_stock = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(updated.quantity)
        .bind(&updated.unit)
        .bind(updated.min_stock)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", &item.id));
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        Ok(())
    }
}
