//! # Order Repository
//!
//! Orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE                                                              │
//! │     └── create(NewOrder) → order + lines in ONE transaction            │
//! │         total_price = Σ unit_price × quantity (fixed from now on)      │
//! │                                                                         │
//! │  2. PROGRESS                                                           │
//! │     └── update_status() pending → preparing → served → paid            │
//! │         (transition rules live in mesa-core::OrderStatus)              │
//! │                                                                         │
//! │  3. CLOSE THE DAY                                                      │
//! │     └── list_paid_with_items() feeds the cash-closing aggregator       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{Money, Order, OrderItem, OrderStatus, OrderWithItems};

const ORDER_COLUMNS: &str =
    "id, restaurant_id, table_id, waiter_id, status, total_price, notes, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, menu_item_id, quantity, unit_price, notes, created_at";

/// A line to insert. `unit_price` is the menu price at the time of ordering.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub restaurant_id: String,
    pub table_id: Option<String>,
    pub waiter_id: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with all its lines atomically.
    ///
    /// The order starts `pending`; its total is computed from the lines. A
    /// total that does not fit in `i64` is a `CheckViolation` and nothing is
    /// written.
    pub async fn create(&self, new: NewOrder) -> DbResult<OrderWithItems> {
        let now = Utc::now();
        let order_id = new_id();

        let items: Vec<OrderItem> = new
            .items
            .into_iter()
            .map(|line| OrderItem {
                id: new_id(),
                order_id: order_id.clone(),
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                notes: line.notes,
                created_at: now,
            })
            .collect();

        let total_price =
            OrderItem::order_total(&items).map_err(|e| DbError::CheckViolation(e.to_string()))?;

        let order = Order {
            id: order_id,
            restaurant_id: new.restaurant_id,
            table_id: new.table_id,
            waiter_id: new.waiter_id,
            status: OrderStatus::Pending,
            total_price,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %order.id,
            restaurant_id = %order.restaurant_id,
            lines = items.len(),
            total = %order.total_price,
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, restaurant_id, table_id, waiter_id, status,
                total_price, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.restaurant_id)
        .bind(&order.table_id)
        .bind(&order.waiter_id)
        .bind(order.status)
        .bind(order.total_price)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, menu_item_id, quantity, unit_price, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.menu_item_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(&item.notes)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(OrderWithItems { order, items })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// An order with its lines, or `None`.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<OrderWithItems>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.items_for_order(id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    pub async fn items_for_order(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Orders of a restaurant, newest first, optionally filtered by status.
    pub async fn list_by_restaurant(
        &self,
        restaurant_id: &str,
        status: Option<OrderStatus>,
    ) -> DbResult<Vec<Order>> {
        let orders = match status {
            Some(status) => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     WHERE restaurant_id = ?1 AND status = ?2 ORDER BY created_at DESC"
                ))
                .bind(restaurant_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     WHERE restaurant_id = ?1 ORDER BY created_at DESC"
                ))
                .bind(restaurant_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// Every paid order of a restaurant with its lines.
    ///
    /// Two queries (orders, then all their lines) grouped in memory.
    pub async fn list_paid_with_items(&self, restaurant_id: &str) -> DbResult<Vec<OrderWithItems>> {
        let orders = self
            .list_by_restaurant(restaurant_id, Some(OrderStatus::Paid))
            .await?;

        let lines = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.menu_item_id, oi.quantity,
                   oi.unit_price, oi.notes, oi.created_at
            FROM order_items oi
            INNER JOIN orders o ON o.id = oi.order_id
            WHERE o.restaurant_id = ?1 AND o.status = ?2
            ORDER BY oi.created_at, oi.id
            "#,
        )
        .bind(restaurant_id)
        .bind(OrderStatus::Paid)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id.clone()).or_default().push(line);
        }

        debug!(
            restaurant_id = %restaurant_id,
            orders = orders.len(),
            "Loaded paid orders"
        );

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    /// Sets the status. Transition rules are the caller's job.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        debug!(id = %id, status = status.as_str(), "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Deletes an order; its lines go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    pub async fn count_by_restaurant(&self, restaurant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE restaurant_id = ?1")
            .bind(restaurant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn line(menu_item_id: &str, quantity: i64, unit_price: i64) -> NewOrderItem {
        NewOrderItem {
            menu_item_id: menu_item_id.to_string(),
            quantity,
            unit_price: Money::from_minor(unit_price),
            notes: None,
        }
    }

    fn new_order(restaurant_id: &str, items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            restaurant_id: restaurant_id.to_string(),
            table_id: None,
            waiter_id: None,
            notes: Some("no onions".to_string()),
            items,
        }
    }

    #[tokio::test]
    async fn test_create_computes_total_and_stores_lines() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        let created = db
            .orders()
            .create(new_order(
                &restaurant.id,
                vec![line("m1", 2, 30_000), line("m2", 1, 7_500)],
            ))
            .await
            .unwrap();

        assert_eq!(created.order.total_price.minor(), 67_500);
        assert_eq!(created.order.status, OrderStatus::Pending);

        let loaded = db.orders().get_with_items(&created.order.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.order.total_price.minor(), 67_500);
        assert_eq!(db.orders().count_by_restaurant(&restaurant.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_order() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        // quantity 0 violates the CHECK constraint on the second line
        let result = db
            .orders()
            .create(new_order(
                &restaurant.id,
                vec![line("m1", 1, 1_000), line("m2", 0, 1_000)],
            ))
            .await;
        assert!(result.is_err());
        assert_eq!(db.orders().count_by_restaurant(&restaurant.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_overflow_rejected_before_insert() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        let result = db
            .orders()
            .create(new_order(&restaurant.id, vec![line("m1", 2, i64::MAX / 2 + 1)]))
            .await;
        assert!(matches!(result, Err(DbError::CheckViolation(_))));
        assert_eq!(db.orders().count_by_restaurant(&restaurant.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_status_filter_and_paid_listing() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        let paid = db
            .orders()
            .create(new_order(&restaurant.id, vec![line("m1", 1, 10_000)]))
            .await
            .unwrap();
        db.orders()
            .create(new_order(&restaurant.id, vec![line("m1", 3, 10_000)]))
            .await
            .unwrap();

        let updated = db
            .orders()
            .update_status(&paid.order.id, OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);

        let pending = db
            .orders()
            .list_by_restaurant(&restaurant.id, Some(OrderStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        let all = db.orders().list_by_restaurant(&restaurant.id, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let paid_orders = db.orders().list_paid_with_items(&restaurant.id).await.unwrap();
        assert_eq!(paid_orders.len(), 1);
        assert_eq!(paid_orders[0].order.id, paid.order.id);
        assert_eq!(paid_orders[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        let created = db
            .orders()
            .create(new_order(&restaurant.id, vec![line("m1", 1, 10_000)]))
            .await
            .unwrap();
        db.orders().delete(&created.order.id).await.unwrap();

        assert!(db.orders().items_for_order(&created.order.id).await.unwrap().is_empty());
        assert!(db.orders().delete(&created.order.id).await.unwrap_err().is_not_found());
    }
}
