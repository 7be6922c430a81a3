//! # Cash Closing Repository
//!
//! One row per restaurant and day, enforced by a unique index on
//! `(restaurant_id, closing_date)`. Two concurrent creates for the same day
//! race on that index; the loser gets `UniqueViolation`.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{CashClosing, CashClosingTotals, Money};

const CASH_CLOSING_COLUMNS: &str = "id, restaurant_id, closing_date, cash_in_register, \
    cash_withdrawn, notes, total_sales, total_revenue, total_costs, total_profit, \
    order_count, average_order_value, created_at, updated_at";

/// Operator-entered fields plus the totals computed for the day.
#[derive(Debug, Clone)]
pub struct NewCashClosing {
    pub cash_in_register: Money,
    pub cash_withdrawn: Money,
    pub notes: Option<String>,
    pub totals: CashClosingTotals,
}

#[derive(Debug, Clone)]
pub struct CashClosingRepository {
    pool: SqlitePool,
}

impl CashClosingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashClosingRepository { pool }
    }

    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the day is already closed
    pub async fn create(&self, new: NewCashClosing) -> DbResult<CashClosing> {
        let now = Utc::now();
        let mut closing = CashClosing {
            id: new_id(),
            restaurant_id: new.totals.restaurant_id.clone(),
            closing_date: new.totals.closing_date,
            cash_in_register: new.cash_in_register,
            cash_withdrawn: new.cash_withdrawn,
            notes: new.notes,
            total_sales: Money::zero(),
            total_revenue: Money::zero(),
            total_costs: Money::zero(),
            total_profit: Money::zero(),
            order_count: 0,
            average_order_value: Money::zero(),
            created_at: now,
            updated_at: now,
        };
        new.totals.apply_to(&mut closing);

        debug!(
            id = %closing.id,
            restaurant_id = %closing.restaurant_id,
            date = %closing.closing_date,
            "Inserting cash closing"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_closings (
                id, restaurant_id, closing_date, cash_in_register, cash_withdrawn, notes,
                total_sales, total_revenue, total_costs, total_profit,
                order_count, average_order_value, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&closing.id)
        .bind(&closing.restaurant_id)
        .bind(closing.closing_date)
        .bind(closing.cash_in_register)
        .bind(closing.cash_withdrawn)
        .bind(&closing.notes)
        .bind(closing.total_sales)
        .bind(closing.total_revenue)
        .bind(closing.total_costs)
        .bind(closing.total_profit)
        .bind(closing.order_count)
        .bind(closing.average_order_value)
        .bind(closing.created_at)
        .bind(closing.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("cash closing date", closing.closing_date.to_string())
            }
            other => other,
        })?;

        Ok(closing)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashClosing>> {
        let closing = sqlx::query_as::<_, CashClosing>(&format!(
            "SELECT {CASH_CLOSING_COLUMNS} FROM cash_closings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(closing)
    }

    pub async fn get_by_date(
        &self,
        restaurant_id: &str,
        closing_date: NaiveDate,
    ) -> DbResult<Option<CashClosing>> {
        let closing = sqlx::query_as::<_, CashClosing>(&format!(
            "SELECT {CASH_CLOSING_COLUMNS} FROM cash_closings \
             WHERE restaurant_id = ?1 AND closing_date = ?2"
        ))
        .bind(restaurant_id)
        .bind(closing_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(closing)
    }

    /// Closings of a restaurant, newest day first.
    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<CashClosing>> {
        let closings = sqlx::query_as::<_, CashClosing>(&format!(
            "SELECT {CASH_CLOSING_COLUMNS} FROM cash_closings \
             WHERE restaurant_id = ?1 ORDER BY closing_date DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(closings)
    }

    /// Writes operator fields and derived totals. The date is immutable.
    pub async fn update(&self, closing: &CashClosing) -> DbResult<CashClosing> {
        debug!(id = %closing.id, "Updating cash closing");

        let mut updated = closing.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE cash_closings SET
                cash_in_register = ?2,
                cash_withdrawn = ?3,
                notes = ?4,
                total_sales = ?5,
                total_revenue = ?6,
                total_costs = ?7,
                total_profit = ?8,
                order_count = ?9,
                average_order_value = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(updated.cash_in_register)
        .bind(updated.cash_withdrawn)
        .bind(&updated.notes)
        .bind(updated.total_sales)
        .bind(updated.total_revenue)
        .bind(updated.total_costs)
        .bind(updated.total_profit)
        .bind(updated.order_count)
        .bind(updated.average_order_value)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashClosing", &closing.id));
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting cash closing");

        let result = sqlx::query("DELETE FROM cash_closings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashClosing", id));
        }

        Ok(())
    }

    /// Closings with `from <= closing_date < until`.
    pub async fn count_in_range(
        &self,
        restaurant_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cash_closings \
             WHERE restaurant_id = ?1 AND closing_date >= ?2 AND closing_date < ?3",
        )
        .bind(restaurant_id)
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_closing(restaurant_id: &str, closing_date: NaiveDate) -> NewCashClosing {
        let mut totals = CashClosingTotals::empty(restaurant_id, closing_date);
        totals.total_sales = Money::from_minor(75_000);
        totals.total_revenue = Money::from_minor(75_000);
        totals.total_costs = Money::from_minor(31_200);
        totals.total_profit = Money::from_minor(43_800);
        totals.order_count = 2;
        totals.average_order_value = Money::from_minor(37_500);
        NewCashClosing {
            cash_in_register: Money::from_minor(200_000),
            cash_withdrawn: Money::from_minor(50_000),
            notes: None,
            totals,
        }
    }

    #[tokio::test]
    async fn test_create_persists_totals() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        let created = db
            .cash_closings()
            .create(new_closing(&restaurant.id, date(2025, 8, 15)))
            .await
            .unwrap();

        let loaded = db.cash_closings().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.closing_date, date(2025, 8, 15));
        assert_eq!(loaded.total_profit.minor(), 43_800);
        assert_eq!(loaded.order_count, 2);
        assert_eq!(loaded.average_order_value.minor(), 37_500);
        assert_eq!(loaded.cash_withdrawn.minor(), 50_000);

        let by_date = db
            .cash_closings()
            .get_by_date(&restaurant.id, date(2025, 8, 15))
            .await
            .unwrap();
        assert_eq!(by_date.map(|c| c.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_one_closing_per_day() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        db.cash_closings()
            .create(new_closing(&restaurant.id, date(2025, 8, 15)))
            .await
            .unwrap();
        let err = db
            .cash_closings()
            .create(new_closing(&restaurant.id, date(2025, 8, 15)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_monthly_count_and_ordering() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        for d in [date(2025, 7, 31), date(2025, 8, 1), date(2025, 8, 31), date(2025, 9, 1)] {
            db.cash_closings().create(new_closing(&restaurant.id, d)).await.unwrap();
        }

        let count = db
            .cash_closings()
            .count_in_range(&restaurant.id, date(2025, 8, 1), date(2025, 9, 1))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let listed = db.cash_closings().list_by_restaurant(&restaurant.id).await.unwrap();
        assert_eq!(listed.first().map(|c| c.closing_date), Some(date(2025, 9, 1)));
        assert_eq!(listed.last().map(|c| c.closing_date), Some(date(2025, 7, 31)));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        let created = db
            .cash_closings()
            .create(new_closing(&restaurant.id, date(2025, 8, 15)))
            .await
            .unwrap();

        let mut edited = created.clone();
        edited.notes = Some("Register short by 2000".to_string());
        edited.order_count = 3;
        db.cash_closings().update(&edited).await.unwrap();

        let loaded = db.cash_closings().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("Register short by 2000"));
        assert_eq!(loaded.order_count, 3);

        db.cash_closings().delete(&created.id).await.unwrap();
        assert!(db.cash_closings().get_by_id(&created.id).await.unwrap().is_none());
    }
}
