//! # Cash Closing Service
//!
//! Loads a day's inputs, runs the pure aggregator from `mesa-core` and merges
//! the operator's figures before storing.
//!
//! ```text
//! orders.list_paid_with_items(restaurant) ─┐
//!                                          ├─► calculate_cash_closing ─► totals
//! menu_items.list_by_restaurant ──► map ───┘                               │
//!                                                                          ▼
//!                     cash in register, cash withdrawn, notes ──► cash_closings
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use mesa_core::validation::{parse_closing_date, validate_amount};
use mesa_core::{
    calculate_cash_closing, counts_toward_closing, CashClosing, CashClosingTotals, MenuItem,
    Money, Restaurant,
};
use mesa_db::{Database, NewCashClosing};

use crate::error::{ApiError, ApiResult};
use crate::services::limiter::{FeatureLimiter, Quota};

/// Create payload. `closingDate` is `YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClosingRequest {
    pub closing_date: String,
    pub cash_in_register: Money,
    pub cash_withdrawn: Money,
    pub notes: Option<String>,
}

/// Update payload: operator fields only; totals are always recomputed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingUpdateRequest {
    pub cash_in_register: Money,
    pub cash_withdrawn: Money,
    pub notes: Option<String>,
}

fn validate_operator_fields(cash_in_register: Money, cash_withdrawn: Money) -> ApiResult<()> {
    validate_amount("cashInRegister", cash_in_register.minor())?;
    validate_amount("cashWithdrawn", cash_withdrawn.minor())?;
    Ok(())
}

/// Derived totals of one restaurant and UTC day. Read-only.
pub async fn compute_totals(
    db: &Database,
    restaurant_id: &str,
    closing_date: NaiveDate,
) -> ApiResult<CashClosingTotals> {
    let orders = db.orders().list_paid_with_items(restaurant_id).await?;
    let menu_items: HashMap<String, MenuItem> = db
        .menu_items()
        .list_by_restaurant(restaurant_id)
        .await?
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    for entry in orders
        .iter()
        .filter(|o| counts_toward_closing(&o.order, closing_date))
    {
        for line in entry
            .items
            .iter()
            .filter(|line| !menu_items.contains_key(&line.menu_item_id))
        {
            warn!(
                order_id = %entry.order.id,
                menu_item_id = %line.menu_item_id,
                "Menu item missing, line adds no cost to the closing"
            );
        }
    }

    Ok(calculate_cash_closing(
        restaurant_id,
        closing_date,
        &orders,
        &menu_items,
    )?)
}

pub async fn preview(
    db: &Database,
    restaurant_id: &str,
    raw_date: &str,
) -> ApiResult<CashClosingTotals> {
    let closing_date = parse_closing_date(raw_date)?;
    compute_totals(db, restaurant_id, closing_date).await
}

/// Closes a day. Rejects a second closing for the same day with 409 and a
/// third closing in a month on the free tier with 402.
pub async fn create(
    db: &Database,
    restaurant: &Restaurant,
    request: NewClosingRequest,
) -> ApiResult<CashClosing> {
    let closing_date = parse_closing_date(&request.closing_date)?;
    validate_operator_fields(request.cash_in_register, request.cash_withdrawn)?;

    if db
        .cash_closings()
        .get_by_date(&restaurant.id, closing_date)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "A cash closing for {} already exists",
            closing_date
        )));
    }

    FeatureLimiter::new(db.clone())
        .ensure_can_create(
            &restaurant.owner_id,
            Quota::CashClosings {
                restaurant_id: &restaurant.id,
                date: closing_date,
            },
            1,
        )
        .await?;

    let totals = compute_totals(db, &restaurant.id, closing_date).await?;
    let closing = db
        .cash_closings()
        .create(NewCashClosing {
            cash_in_register: request.cash_in_register,
            cash_withdrawn: request.cash_withdrawn,
            notes: request.notes,
            totals,
        })
        .await?;

    info!(
        closing_id = %closing.id,
        restaurant_id = %closing.restaurant_id,
        date = %closing.closing_date,
        orders = closing.order_count,
        "Cash closing created"
    );
    Ok(closing)
}

/// Replaces the operator fields and recomputes the totals from current data.
pub async fn update(
    db: &Database,
    existing: CashClosing,
    request: ClosingUpdateRequest,
) -> ApiResult<CashClosing> {
    validate_operator_fields(request.cash_in_register, request.cash_withdrawn)?;

    let totals = compute_totals(db, &existing.restaurant_id, existing.closing_date).await?;

    let mut closing = existing;
    closing.cash_in_register = request.cash_in_register;
    closing.cash_withdrawn = request.cash_withdrawn;
    closing.notes = request.notes;
    totals.apply_to(&mut closing);

    Ok(db.cash_closings().update(&closing).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use mesa_core::{Ingredient, OrderStatus, UserRole};
    use mesa_db::{DbConfig, NewMenuItem, NewOrder, NewOrderItem, NewRestaurant, NewUser};

    async fn setup() -> (Database, Restaurant) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = db
            .users()
            .create(NewUser {
                name: "Owner".to_string(),
                email: "owner@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Admin,
                phone: None,
                restaurant_id: None,
            })
            .await
            .unwrap();
        let restaurant = db
            .restaurants()
            .create(NewRestaurant {
                owner_id: owner.id,
                name: "La Mesa".to_string(),
                address: None,
                phone: None,
                description: None,
            })
            .await
            .unwrap();
        (db, restaurant)
    }

    fn request(date: &str) -> NewClosingRequest {
        NewClosingRequest {
            closing_date: date.to_string(),
            cash_in_register: Money::from_minor(100_000),
            cash_withdrawn: Money::zero(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_today_totals_from_paid_orders() {
        let (db, restaurant) = setup().await;
        let dish = db
            .menu_items()
            .create(NewMenuItem {
                restaurant_id: restaurant.id.clone(),
                name: "Bandeja".to_string(),
                description: None,
                price: Money::from_minor(25_000),
                category: None,
                is_available: true,
                ingredients: vec![Ingredient {
                    name: "Beans".to_string(),
                    quantity: 0.2,
                    unit: "kg".to_string(),
                    price: Money::from_minor(6_000),
                }],
            })
            .await
            .unwrap();

        let order = db
            .orders()
            .create(NewOrder {
                restaurant_id: restaurant.id.clone(),
                table_id: None,
                waiter_id: None,
                notes: None,
                items: vec![NewOrderItem {
                    menu_item_id: dish.id.clone(),
                    quantity: 2,
                    unit_price: dish.price,
                    notes: None,
                }],
            })
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let before = compute_totals(&db, &restaurant.id, today).await.unwrap();
        assert_eq!(before.order_count, 0);

        db.orders()
            .update_status(&order.order.id, OrderStatus::Paid)
            .await
            .unwrap();

        let totals = compute_totals(&db, &restaurant.id, today).await.unwrap();
        assert_eq!(totals.order_count, 1);
        assert_eq!(totals.total_sales.minor(), 50_000);
        assert_eq!(totals.total_costs.minor(), 12_000);
        assert_eq!(totals.total_profit.minor(), 38_000);

        let again = compute_totals(&db, &restaurant.id, today).await.unwrap();
        assert_eq!(again, totals);
    }

    #[tokio::test]
    async fn test_create_conflict_and_monthly_limit() {
        let (db, restaurant) = setup().await;

        create(&db, &restaurant, request("2025-08-14")).await.unwrap();
        let dup = create(&db, &restaurant, request("2025-08-14")).await.unwrap_err();
        assert_eq!(dup.code, ErrorCode::Conflict);

        create(&db, &restaurant, request("2025-08-15")).await.unwrap();
        let third = create(&db, &restaurant, request("2025-08-16")).await.unwrap_err();
        assert_eq!(third.code, ErrorCode::LimitExceeded);

        // A new month has its own allowance.
        create(&db, &restaurant, request("2025-09-01")).await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_date_is_invalid_input() {
        let (db, restaurant) = setup().await;
        let err = create(&db, &restaurant, request("15/08/2025")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err = preview(&db, &restaurant.id, "2025-13-01").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_update_replaces_operator_fields() {
        let (db, restaurant) = setup().await;
        let closing = create(&db, &restaurant, request("2025-08-15")).await.unwrap();

        let updated = update(
            &db,
            closing.clone(),
            ClosingUpdateRequest {
                cash_in_register: Money::from_minor(180_000),
                cash_withdrawn: Money::from_minor(20_000),
                notes: Some("Bank deposit".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, closing.id);
        assert_eq!(updated.cash_withdrawn.minor(), 20_000);
        assert_eq!(updated.notes.as_deref(), Some("Bank deposit"));
        assert_eq!(updated.closing_date, closing.closing_date);
    }

    #[test]
    fn test_negative_cash_rejected() {
        assert!(validate_operator_fields(Money::from_minor(-1), Money::zero()).is_err());
        assert!(validate_operator_fields(Money::zero(), Money::zero()).is_ok());
    }
}
