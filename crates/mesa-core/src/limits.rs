//! # Free-Tier Limits
//!
//! The policy half of the feature limiter: which resources are counted, the
//! fixed thresholds, and how a subscription maps to a tier. Counting rows is
//! the database's job; deciding is done here.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  can_create(kind, caller, scope, extra)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Tier::from_subscription(sub, now)                                     │
//! │       │                                                                 │
//! │       ├── Paid ──► allowed (no limits)                                 │
//! │       │                                                                 │
//! │       └── Free ──► count rows in scope                                 │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                 is_within_limit(kind, count, extra)                    │
//! │                 count + extra <= kind.free_tier_limit()                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thresholds
//!
//! | Resource | Scope | Limit |
//! |----------|-------|-------|
//! | Restaurants | owner | 1 |
//! | Menu items | restaurant | 5 |
//! | Raw ingredients | restaurant | 25 |
//! | Orders | restaurant | 25 |
//! | Cash closings | restaurant + calendar month | 2 |
//! | Waiter accounts | restaurant | 3 |

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::Subscription;

// =============================================================================
// Resource Kinds
// =============================================================================

/// A resource whose creation is capped on the free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Restaurants,
    MenuItems,
    RawIngredients,
    Orders,
    CashClosings,
    WaiterAccounts,
}

impl ResourceKind {
    /// Every counted resource, in display order.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Restaurants,
        ResourceKind::MenuItems,
        ResourceKind::RawIngredients,
        ResourceKind::Orders,
        ResourceKind::CashClosings,
        ResourceKind::WaiterAccounts,
    ];

    /// Maximum number of rows a free account may hold in this resource's scope.
    pub const fn free_tier_limit(&self) -> i64 {
        match self {
            ResourceKind::Restaurants => 1,
            ResourceKind::MenuItems => 5,
            ResourceKind::RawIngredients => 25,
            ResourceKind::Orders => 25,
            ResourceKind::CashClosings => 2,
            ResourceKind::WaiterAccounts => 3,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Restaurants => "restaurants",
            ResourceKind::MenuItems => "menu items",
            ResourceKind::RawIngredients => "raw ingredients",
            ResourceKind::Orders => "orders",
            ResourceKind::CashClosings => "cash closings",
            ResourceKind::WaiterAccounts => "waiter accounts",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tier
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Paid,
}

impl Tier {
    /// Paid only for an active subscription whose period has not ended.
    /// No subscription at all is the free tier.
    pub fn from_subscription(subscription: Option<&Subscription>, now: DateTime<Utc>) -> Tier {
        match subscription {
            Some(sub) if sub.is_active_at(now) => Tier::Paid,
            _ => Tier::Free,
        }
    }
}

// =============================================================================
// Checks
// =============================================================================

/// Whether `extra` more rows fit under the free-tier limit of `kind`.
///
/// `extra` is 1 for a single creation and N for a bulk insert of N rows.
///
/// ## Example
/// ```rust
/// use mesa_core::limits::{is_within_limit, ResourceKind};
///
/// // 20 raw ingredients exist; a bulk insert of 5 fits, 6 does not.
/// assert!(is_within_limit(ResourceKind::RawIngredients, 20, 5));
/// assert!(!is_within_limit(ResourceKind::RawIngredients, 20, 6));
/// ```
pub fn is_within_limit(kind: ResourceKind, current_count: i64, extra: i64) -> bool {
    current_count.saturating_add(extra) <= kind.free_tier_limit()
}

/// Current count of one resource against its free-tier limit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub resource: ResourceKind,
    pub count: i64,
    /// `None` on the paid tier.
    pub limit: Option<i64>,
}

impl ResourceUsage {
    pub fn new(resource: ResourceKind, count: i64, tier: Tier) -> Self {
        let limit = match tier {
            Tier::Free => Some(resource.free_tier_limit()),
            Tier::Paid => None,
        };
        ResourceUsage {
            resource,
            count,
            limit,
        }
    }
}

/// First day of the month containing `date`, and first day of the next month.
///
/// Cash closings are limited per calendar month; the range is half-open.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date - Duration::days(i64::from(date.day0()));
    let next = first
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX);
    (first, next)
}

// =============================================================================
// Unit Tests
// =============================================================================
