//! # Restaurant Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::Restaurant;

const RESTAURANT_COLUMNS: &str =
    "id, owner_id, name, address, phone, description, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub owner_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RestaurantRepository { pool }
    }

    pub async fn create(&self, new: NewRestaurant) -> DbResult<Restaurant> {
        let now = Utc::now();
        let restaurant = Restaurant {
            id: new_id(),
            owner_id: new.owner_id,
            name: new.name,
            address: new.address,
            phone: new.phone,
            description: new.description,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %restaurant.id, owner_id = %restaurant.owner_id, "Inserting restaurant");

        sqlx::query(
            r#"
            INSERT INTO restaurants (
                id, owner_id, name, address, phone, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&restaurant.id)
        .bind(&restaurant.owner_id)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.phone)
        .bind(&restaurant.description)
        .bind(restaurant.created_at)
        .bind(restaurant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(restaurant)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Restaurant>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(restaurant)
    }

    /// Restaurants owned by an account, oldest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Restaurant>> {
        let restaurants = sqlx::query_as::<_, Restaurant>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE owner_id = ?1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(restaurants)
    }

    /// Writes the editable fields and refreshes `updated_at`.
    pub async fn update(&self, restaurant: &Restaurant) -> DbResult<Restaurant> {
        debug!(id = %restaurant.id, "Updating restaurant");

        let mut updated = restaurant.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE restaurants SET
                name = ?2,
                address = ?3,
                phone = ?4,
                description = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(&updated.address)
        .bind(&updated.phone)
        .bind(&updated.description)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", &restaurant.id));
        }

        Ok(updated)
    }

    /// Deletes a restaurant and, through cascading keys, everything it owns.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting restaurant");

        let result = sqlx::query("DELETE FROM restaurants WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        Ok(())
    }

    pub async fn count_by_owner(&self, owner_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM restaurants WHERE owner_id = ?1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
