//! # mesa-core: Pure Business Logic for Mesa
//!
//! Domain types and the rules that do not need a database: money math,
//! input validation, the free-tier limit policy and the daily cash-closing
//! aggregation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Mesa Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/api (axum HTTP server)                    │   │
//! │  │   routes ──► services (auth, limiter, cash closing) ──► db      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ mesa-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │validation│ │ limits │ │  cash   │  │   │
//! │  │   │ Order   │ │  Money  │ │  email   │ │  Tier  │ │ closing │  │   │
//! │  │   │ MenuItem│ │         │ │  dates   │ │ Limits │ │ totals  │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mesa-db (Database Layer)                       │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Restaurant, Order, CashClosing, ...)
//! - [`money`] - Money type with checked integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`limits`] - Free-tier thresholds and subscription tier rules
//! - [`cash_closing`] - Daily sales/cost aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use mesa_core::limits::{ResourceKind, is_within_limit};
//!
//! // A free account that already has 4 menu items may add a 5th...
//! assert!(is_within_limit(ResourceKind::MenuItems, 4, 1));
//! // ...but not a 6th.
//! assert!(!is_within_limit(ResourceKind::MenuItems, 5, 1));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cash_closing;
pub mod error;
pub mod limits;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cash_closing::{calculate_cash_closing, counts_toward_closing, CashClosingTotals};
pub use error::{CoreError, ValidationError};
pub use limits::{ResourceKind, Tier};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line in an order.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of lines in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Largest accepted amount (price, ingredient cost, register cash, plan
/// payment), in minor units.
///
/// A full order (`MAX_ORDER_ITEMS` lines of `MAX_ITEM_QUANTITY` at this
/// price) stays below `i64::MAX` by a factor of about 90.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Length of a paid plan period, in days.
///
/// Plan activation opens a period of this length starting now.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;
