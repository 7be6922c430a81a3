//! # Table Repository
//!
//! Dining tables live in `restaurant_tables` (`table` is an SQL keyword).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{Table, TableStatus};

const TABLE_COLUMNS: &str = "id, restaurant_id, number, capacity, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewTable {
    pub restaurant_id: String,
    pub number: i64,
    pub capacity: i64,
    pub status: TableStatus,
}

#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the number is taken in this restaurant
    pub async fn create(&self, new: NewTable) -> DbResult<Table> {
        let now = Utc::now();
        let table = Table {
            id: new_id(),
            restaurant_id: new.restaurant_id,
            number: new.number,
            capacity: new.capacity,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %table.id, number = table.number, "Inserting table");

        sqlx::query(
            r#"
            INSERT INTO restaurant_tables (
                id, restaurant_id, number, capacity, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&table.id)
        .bind(&table.restaurant_id)
        .bind(table.number)
        .bind(table.capacity)
        .bind(table.status)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("table number", table.number.to_string())
            }
            other => other,
        })?;

        Ok(table)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        let table = sqlx::query_as::<_, Table>(&format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<Table>> {
        let tables = sqlx::query_as::<_, Table>(&format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE restaurant_id = ?1 ORDER BY number"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    pub async fn update(&self, table: &Table) -> DbResult<Table> {
        debug!(id = %table.id, status = ?table.status, "Updating table");

        let mut updated = table.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE restaurant_tables SET
                number = ?2,
                capacity = ?3,
                status = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(updated.number)
        .bind(updated.capacity)
        .bind(updated.status)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("table number", updated.number.to_string())
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", &table.id));
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting table");

        let result = sqlx::query("DELETE FROM restaurant_tables WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        Ok(())
    }
}
