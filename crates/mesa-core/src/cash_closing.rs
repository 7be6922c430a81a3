//! # Cash Closing Aggregation
//!
//! Recomputes the derived totals of a day's cash closing from paid orders.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders (restaurant, any status)                                        │
//! │       │                                                                 │
//! │       ▼  keep status == Paid && created_at (UTC) on closing date        │
//! │  ┌───────────────────────────────────────────────┐                      │
//! │  │ per order                                     │                      │
//! │  │   sales   += total_price                      │                      │
//! │  │   revenue  = sales                            │                      │
//! │  │   count   += 1                                │                      │
//! │  │   per line item                               │                      │
//! │  │     menu item found?                          │                      │
//! │  │       yes → costs += Σ ingredient.price × qty │                      │
//! │  │       no  → line contributes no cost          │                      │
//! │  └───────────────────────────────────────────────┘                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  profit = revenue − costs                                               │
//! │  average = sales / count  (0 when count == 0)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The function is pure: the same orders and menu items always give the same
//! totals, so a closing can be recomputed at any time.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{CashClosing, MenuItem, Order, OrderStatus, OrderWithItems};

/// Derived totals for one restaurant and one UTC calendar day.
///
/// Carries no operator-entered fields (cash in register, cash withdrawn,
/// notes); those are merged when the closing is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashClosingTotals {
    pub restaurant_id: String,
    #[ts(as = "String")]
    pub closing_date: NaiveDate,
    pub total_sales: Money,
    /// Same source as `total_sales`; no discount or tax model separates them.
    pub total_revenue: Money,
    pub total_costs: Money,
    pub total_profit: Money,
    pub order_count: i64,
    pub average_order_value: Money,
}

impl CashClosingTotals {
    /// All-zero totals for a day without paid orders.
    pub fn empty(restaurant_id: &str, closing_date: NaiveDate) -> Self {
        CashClosingTotals {
            restaurant_id: restaurant_id.to_string(),
            closing_date,
            total_sales: Money::zero(),
            total_revenue: Money::zero(),
            total_costs: Money::zero(),
            total_profit: Money::zero(),
            order_count: 0,
            average_order_value: Money::zero(),
        }
    }

    /// Overwrites the six derived fields of a stored closing.
    pub fn apply_to(&self, closing: &mut CashClosing) {
        closing.total_sales = self.total_sales;
        closing.total_revenue = self.total_revenue;
        closing.total_costs = self.total_costs;
        closing.total_profit = self.total_profit;
        closing.order_count = self.order_count;
        closing.average_order_value = self.average_order_value;
    }
}

/// Whether `order` belongs to the closing of `closing_date`: paid, and
/// created on that UTC calendar day.
pub fn counts_toward_closing(order: &Order, closing_date: NaiveDate) -> bool {
    order.status == OrderStatus::Paid && order.created_at.date_naive() == closing_date
}

/// Aggregates paid orders of `closing_date` into cash closing totals.
///
/// Fails with [`CoreError::AmountOverflow`] when a total does not fit in
/// `i64` minor units.
///
/// ## Arguments
/// * `orders` - Orders of the restaurant with their items. Orders that are not
///   paid, or not created on `closing_date` in UTC, are ignored.
/// * `menu_items` - Menu items by id. A line whose menu item is missing adds
///   nothing to the costs; its order still counts towards sales.
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use chrono::NaiveDate;
/// use mesa_core::calculate_cash_closing;
///
/// let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
/// let totals = calculate_cash_closing("r1", date, &[], &HashMap::new()).unwrap();
/// assert_eq!(totals.order_count, 0);
/// assert!(totals.average_order_value.is_zero());
/// ```
pub fn calculate_cash_closing(
    restaurant_id: &str,
    closing_date: NaiveDate,
    orders: &[OrderWithItems],
    menu_items: &HashMap<String, MenuItem>,
) -> Result<CashClosingTotals, CoreError> {
    let overflow = |what: &str| CoreError::AmountOverflow(format!("{what} for {closing_date}"));
    let mut totals = CashClosingTotals::empty(restaurant_id, closing_date);

    let paid_that_day = orders
        .iter()
        .filter(|o| counts_toward_closing(&o.order, closing_date));

    for entry in paid_that_day {
        totals.total_sales = totals
            .total_sales
            .checked_add(entry.order.total_price)
            .ok_or_else(|| overflow("total sales"))?;
        totals.order_count += 1;

        for item in &entry.items {
            let Some(menu_item) = menu_items.get(&item.menu_item_id) else {
                continue;
            };
            let line_cost = menu_item
                .ingredient_cost()?
                .checked_multiply_quantity(item.quantity)
                .ok_or_else(|| overflow("line cost"))?;
            totals.total_costs = totals
                .total_costs
                .checked_add(line_cost)
                .ok_or_else(|| overflow("total costs"))?;
        }
    }

    totals.total_revenue = totals.total_sales;
    totals.total_profit = totals
        .total_revenue
        .checked_sub(totals.total_costs)
        .ok_or_else(|| overflow("total profit"))?;
    totals.average_order_value = totals.total_sales.average_over(totals.order_count);
    Ok(totals)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Ingredient, OrderItem};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn menu_item(id: &str, price: i64, ingredient_prices: &[i64]) -> MenuItem {
        let now = Utc::now();
        MenuItem {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            name: id.to_string(),
            description: None,
            price: Money::from_minor(price),
            category: None,
            is_available: true,
            ingredients: ingredient_prices
                .iter()
                .enumerate()
                .map(|(i, p)| Ingredient {
                    name: format!("ing-{i}"),
                    quantity: 1.0,
                    unit: "unit".to_string(),
                    price: Money::from_minor(*p),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn order(
        id: &str,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        lines: &[(&str, i64, i64)],
    ) -> OrderWithItems {
        let items: Vec<OrderItem> = lines
            .iter()
            .enumerate()
            .map(|(i, (menu_item_id, qty, unit_price))| OrderItem {
                id: format!("{id}-{i}"),
                order_id: id.to_string(),
                menu_item_id: menu_item_id.to_string(),
                quantity: *qty,
                unit_price: Money::from_minor(*unit_price),
                notes: None,
                created_at,
            })
            .collect();
        let total_price = OrderItem::order_total(&items).unwrap();
        OrderWithItems {
            order: Order {
                id: id.to_string(),
                restaurant_id: "r1".to_string(),
                table_id: None,
                waiter_id: None,
                status,
                total_price,
                notes: None,
                created_at,
                updated_at: created_at,
            },
            items,
        }
    }

    fn menu() -> HashMap<String, MenuItem> {
        [
            menu_item("bandeja", 30_000, &[9_000, 4_000]),
            menu_item("jugo", 7_500, &[1_600]),
        ]
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
    }

    #[test]
    fn test_two_paid_orders_scenario() {
        // A: 2 × 30 000 = 60 000, costs 2 × 13 000 = 26 000
        // B: 2 ×  7 500 = 15 000, costs 2 ×  2 600 =  5 200
        let orders = vec![
            order("a", OrderStatus::Paid, at(2025, 8, 15, 12), &[("bandeja", 2, 30_000)]),
            order("b", OrderStatus::Paid, at(2025, 8, 15, 19), &[("jugo", 2, 7_500)]),
        ];
        let mut menu = menu();
        menu.insert("jugo".to_string(), menu_item("jugo", 7_500, &[2_600]));

        let totals = calculate_cash_closing("r1", date(), &orders, &menu).unwrap();

        assert_eq!(totals.total_sales.minor(), 75_000);
        assert_eq!(totals.total_revenue.minor(), 75_000);
        assert_eq!(totals.total_costs.minor(), 31_200);
        assert_eq!(totals.total_profit.minor(), 43_800);
        assert_eq!(totals.order_count, 2);
        assert_eq!(totals.average_order_value.minor(), 37_500);
        assert_eq!(totals.restaurant_id, "r1");
        assert_eq!(totals.closing_date, date());
    }

    #[test]
    fn test_no_paid_orders_yields_zeroes() {
        let orders = vec![
            order("p", OrderStatus::Pending, at(2025, 8, 15, 10), &[("bandeja", 1, 30_000)]),
            order("c", OrderStatus::Cancelled, at(2025, 8, 15, 11), &[("jugo", 1, 7_500)]),
        ];
        let totals = calculate_cash_closing("r1", date(), &orders, &menu()).unwrap();
        assert_eq!(totals, CashClosingTotals::empty("r1", date()));
    }

    #[test]
    fn test_orders_on_other_days_ignored() {
        let orders = vec![
            order("late", OrderStatus::Paid, at(2025, 8, 14, 23), &[("jugo", 1, 7_500)]),
            order("in", OrderStatus::Paid, at(2025, 8, 15, 0), &[("jugo", 1, 7_500)]),
            order("next", OrderStatus::Paid, at(2025, 8, 16, 0), &[("jugo", 1, 7_500)]),
        ];
        let totals = calculate_cash_closing("r1", date(), &orders, &menu()).unwrap();
        assert_eq!(totals.order_count, 1);
        assert_eq!(totals.total_sales.minor(), 7_500);
    }

    #[test]
    fn test_missing_menu_item_skips_cost_only() {
        let orders = vec![order(
            "a",
            OrderStatus::Paid,
            at(2025, 8, 15, 13),
            &[("bandeja", 1, 30_000), ("deleted", 3, 5_000)],
        )];
        let totals = calculate_cash_closing("r1", date(), &orders, &menu()).unwrap();
        assert_eq!(totals.total_sales.minor(), 45_000);
        assert_eq!(totals.total_costs.minor(), 13_000);
        assert_eq!(totals.total_profit.minor(), 32_000);
    }

    #[test]
    fn test_idempotent() {
        let orders = vec![
            order("a", OrderStatus::Paid, at(2025, 8, 15, 12), &[("bandeja", 1, 30_000)]),
            order("b", OrderStatus::Paid, at(2025, 8, 15, 13), &[("jugo", 3, 7_500)]),
        ];
        let menu = menu();
        let first = calculate_cash_closing("r1", date(), &orders, &menu).unwrap();
        let second = calculate_cash_closing("r1", date(), &orders, &menu).unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_average_truncates() {
        let orders = vec![
            order("a", OrderStatus::Paid, at(2025, 8, 15, 12), &[("jugo", 1, 1_000)]),
            order("b", OrderStatus::Paid, at(2025, 8, 15, 13), &[("jugo", 1, 1_000)]),
            order("c", OrderStatus::Paid, at(2025, 8, 15, 14), &[("jugo", 1, 1_001)]),
        ];
        let totals = calculate_cash_closing("r1", date(), &orders, &menu()).unwrap();
        assert_eq!(totals.average_order_value.minor(), 1_000);
    }

    #[test]
    fn test_cost_overflow_is_an_error() {
        let huge = i64::MAX / 2 + 1;
        let mut menu = menu();
        menu.insert("caviar".to_string(), menu_item("caviar", 1_000, &[huge]));
        let orders = vec![order(
            "a",
            OrderStatus::Paid,
            at(2025, 8, 15, 20),
            &[("caviar", 2, 1_000)],
        )];

        let result = calculate_cash_closing("r1", date(), &orders, &menu);
        assert!(matches!(result, Err(CoreError::AmountOverflow(_))));
    }

    #[test]
    fn test_sales_overflow_is_an_error() {
        let huge = i64::MAX / 2 + 1;
        let orders = vec![
            order("a", OrderStatus::Paid, at(2025, 8, 15, 12), &[("gone", 1, huge)]),
            order("b", OrderStatus::Paid, at(2025, 8, 15, 13), &[("gone", 1, huge)]),
        ];

        let result = calculate_cash_closing("r1", date(), &orders, &menu());
        assert!(matches!(result, Err(CoreError::AmountOverflow(_))));
    }
}
