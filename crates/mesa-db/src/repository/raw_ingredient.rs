//! # Raw Ingredient Repository
//!
//! Supports single and bulk inserts; a bulk insert is all-or-nothing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{Money, RawIngredient};

const RAW_INGREDIENT_COLUMNS: &str =
    "id, restaurant_id, name, unit, cost_per_unit, stock, created_at, updated_at";

const INSERT_RAW_INGREDIENT: &str = r#"
    INSERT INTO raw_ingredients (
        id, restaurant_id, name, unit, cost_per_unit, stock, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

#[derive(Debug, Clone)]
pub struct NewRawIngredient {
    pub restaurant_id: String,
    pub name: String,
    pub unit: String,
    pub cost_per_unit: Money,
    pub stock: f64,
}

impl NewRawIngredient {
    fn into_row(self) -> RawIngredient {
        let now = Utc::now();
        RawIngredient {
            id: new_id(),
            restaurant_id: self.restaurant_id,
            name: self.name,
            unit: self.unit,
            cost_per_unit: self.cost_per_unit,
            stock: self.stock,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawIngredientRepository {
    pool: SqlitePool,
}

impl RawIngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RawIngredientRepository { pool }
    }

    pub async fn create(&self, new: NewRawIngredient) -> DbResult<RawIngredient> {
        let row = new.into_row();

        debug!(id = %row.id, name = %row.name, "Inserting raw ingredient");

        sqlx::query(INSERT_RAW_INGREDIENT)
            .bind(&row.id)
            .bind(&row.restaurant_id)
            .bind(&row.name)
            .bind(&row.unit)
            .bind(row.cost_per_unit)
            .bind(row.stock)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(row)
    }

    /// Inserts every row in one transaction.
    pub async fn create_many(&self, new: Vec<NewRawIngredient>) -> DbResult<Vec<RawIngredient>> {
        let rows: Vec<RawIngredient> = new.into_iter().map(NewRawIngredient::into_row).collect();

        debug!(count = rows.len(), "Bulk inserting raw ingredients");

        let mut tx = self.pool.begin().await?;
        for row in &rows {
            sqlx::query(INSERT_RAW_INGREDIENT)
                .bind(&row.id)
                .bind(&row.restaurant_id)
                .bind(&row.name)
                .bind(&row.unit)
                .bind(row.cost_per_unit)
                .bind(row.stock)
                .bind(row.created_at)
                .bind(row.updated_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RawIngredient>> {
        let row = sqlx::query_as::<_, RawIngredient>(&format!(
            "SELECT {RAW_INGREDIENT_COLUMNS} FROM raw_ingredients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<RawIngredient>> {
        let rows = sqlx::query_as::<_, RawIngredient>(&format!(
            "SELECT {RAW_INGREDIENT_COLUMNS} FROM raw_ingredients WHERE restaurant_id = ?1 ORDER BY name"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update(&self, row: &RawIngredient) -> DbResult<RawIngredient> {
        debug!(id = %row.id, "Updating raw ingredient");

        let mut updated = row.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE raw_ingredients SET
                name = ?2,
                unit = ?3,
                cost_per_unit = ?4,
                stock = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(&updated.unit)
        .bind(updated.cost_per_unit)
        .bind(updated.stock)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RawIngredient", &row.id));
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM raw_ingredients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RawIngredient", id));
        }

        Ok(())
    }

    pub async fn count_by_restaurant(&self, restaurant_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM raw_ingredients WHERE restaurant_id = ?1")
                .bind(restaurant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
