//! # Subscription Repository
//!
//! At most one row per account (`user_id` is unique); writes are upserts.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{Money, Subscription, SubscriptionStatus};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, status, current_period_start, \
    current_period_end, amount, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    pub async fn get_by_user(&self, user_id: &str) -> DbResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Creates the account's subscription or replaces its status, period and
    /// amount. The row id and `created_at` survive an update.
    pub async fn upsert(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        amount: Money,
    ) -> DbResult<Subscription> {
        debug!(user_id = %user_id, status = ?status, "Upserting subscription");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, status, current_period_start, current_period_end,
                amount, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(user_id) DO UPDATE SET
                status = excluded.status,
                current_period_start = excluded.current_period_start,
                current_period_end = excluded.current_period_end,
                amount = excluded.amount,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(status)
        .bind(period_start)
        .bind(period_end)
        .bind(amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_user(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Subscription", user_id))
    }

    /// Changes only the status, keeping the period.
    pub async fn set_status(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
    ) -> DbResult<Subscription> {
        debug!(user_id = %user_id, status = ?status, "Setting subscription status");

        let result =
            sqlx::query("UPDATE subscriptions SET status = ?2, updated_at = ?3 WHERE user_id = ?1")
                .bind(user_id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Subscription", user_id));
        }

        self.get_by_user(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Subscription", user_id))
    }
}
