//! # Domain Types
//!
//! Core domain types used throughout Mesa.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                   │
//! │                                                                         │
//! │  User ──owns──► Restaurant ──┬──► MenuItem (ingredients: Vec)           │
//! │   │                          ├──► Table                                 │
//! │   │ (waiter.restaurant_id)   ├──► Order ──► OrderItem ──► MenuItem      │
//! │   └──────────────────────────┤                                          │
//! │                              ├──► InventoryItem                         │
//! │  Subscription (1 per user)   ├──► RawIngredient                         │
//! │                              └──► CashClosing (1 per restaurant+day)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string generated by the repository
//! layer. Timestamps are UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Users
// =============================================================================

/// Role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Restaurant owner / manager.
    Admin,
    /// Staff account attached to one restaurant.
    Waiter,
    /// Diner account.
    Customer,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Admin
    }
}

/// A user account.
///
/// The password hash never leaves the server: it is skipped by serde and
/// absent from the generated TypeScript type.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique, stored lowercased.
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    /// Set for waiter accounts.
    pub restaurant_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Restaurants
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Menu
// =============================================================================

/// One ingredient line of a menu item recipe.
///
/// `price` is the cost of `quantity` of this ingredient as used in the
/// recipe, not a unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub price: Money,
}

/// A dish or drink on a restaurant's menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category: Option<String>,
    pub is_available: bool,
    /// Stored as a JSON column.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub ingredients: Vec<Ingredient>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Ingredient cost of one portion.
    pub fn ingredient_cost(&self) -> Result<Money, CoreError> {
        Money::checked_sum(self.ingredients.iter().map(|i| i.price))
            .ok_or_else(|| CoreError::AmountOverflow(format!("ingredient cost of {}", self.id)))
    }
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Available
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub restaurant_id: String,
    /// Unique per restaurant.
    pub number: i64,
    pub capacity: i64,
    pub status: TableStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// The status of an order.
///
/// ## Lifecycle
/// ```text
/// Pending ──► Preparing ──► Served ──► Paid
///    │            │            │
///    └────────────┴────────────┴──► Cancelled
/// ```
/// `Paid` and `Cancelled` are terminal. Only `Paid` orders count towards a
/// cash closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Served,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// Returns true for `Paid` and `Cancelled`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Whether an order may move from `self` to `next`.
    ///
    /// Forward moves may skip steps (a counter sale goes straight from
    /// pending to paid); nothing leaves a terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        next == OrderStatus::Cancelled || next.rank() > self.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Served => 2,
            OrderStatus::Paid => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Served => "served",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    pub table_id: Option<String>,
    pub waiter_id: Option<String>,
    pub status: OrderStatus,
    /// Sum of `unit_price × quantity` over the items, fixed at creation.
    pub total_price: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line of an order.
/// The unit price is a snapshot of the menu price when the order was taken.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> Result<Money, CoreError> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| CoreError::AmountOverflow(format!("line total of {}", self.menu_item_id)))
    }

    /// Sum of the line totals of an order.
    pub fn order_total(items: &[OrderItem]) -> Result<Money, CoreError> {
        items.iter().try_fold(Money::zero(), |total, item| {
            total
                .checked_add(item.line_total()?)
                .ok_or_else(|| CoreError::AmountOverflow("order total".to_string()))
        })
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub min_stock: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Stock at or below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

/// A purchasable raw ingredient (flour, oil, ...) with its unit cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RawIngredient {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub unit: String,
    pub cost_per_unit: Money,
    pub stock: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Cash Closing
// =============================================================================

/// End-of-day summary for one restaurant.
///
/// The six totals are always produced by
/// [`calculate_cash_closing`](crate::cash_closing::calculate_cash_closing);
/// the client only supplies the cash and notes fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashClosing {
    pub id: String,
    pub restaurant_id: String,
    /// Unique per restaurant.
    #[ts(as = "String")]
    pub closing_date: NaiveDate,
    pub cash_in_register: Money,
    pub cash_withdrawn: Money,
    pub notes: Option<String>,
    pub total_sales: Money,
    pub total_revenue: Money,
    pub total_costs: Money,
    pub total_profit: Money,
    pub order_count: i64,
    pub average_order_value: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Subscription
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
}

/// Billing state of an account. At most one per user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub status: SubscriptionStatus,
    #[ts(as = "String")]
    pub current_period_start: DateTime<Utc>,
    #[ts(as = "String")]
    pub current_period_end: DateTime<Utc>,
    pub amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Active means status `active` and the period has not ended at `now`.
    /// Trialing, past-due and canceled subscriptions are never active.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && now <= self.current_period_end
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
