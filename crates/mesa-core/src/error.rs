//! # Core Errors
//!
//! Rule violations raised by pure code. Neither type knows about HTTP; the
//! API crate maps them (`Validation`, `MenuItemNotFound` and `AmountOverflow`
//! to 400, `LimitExceeded` to 402, `InvalidOrderTransition` to 409).

use thiserror::Error;

use crate::limits::ResourceKind;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced menu item does not exist (or belongs to another restaurant).
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// A free-tier account reached the threshold for a resource kind.
    ///
    /// ## User Workflow
    /// ```text
    /// Create 6th menu item on free tier
    ///      │
    ///      ▼
    /// LimitExceeded { resource: MenuItems, limit: 5 }
    ///      │
    ///      ▼
    /// HTTP 402 → UI shows upgrade prompt
    /// ```
    #[error("Free plan limit reached for {resource}: at most {limit} allowed")]
    LimitExceeded { resource: ResourceKind, limit: i64 },

    /// Order is not in a state that allows the requested transition.
    #[error("Order {order_id} is {current_status}, cannot move to {requested}")]
    InvalidOrderTransition {
        order_id: String,
        current_status: String,
        requested: String,
    },

    /// A sum or product of amounts does not fit in `i64` minor units.
    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A request field failed a check in [`crate::validation`]. `field` is the
/// camelCase name the client sent, so messages can be shown as-is.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    /// Passwords only; names and units are capped, not floored.
    #[error("{field} needs at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} allows at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Quantities, line counts, table numbers and capacities.
    #[error("{field} must be within {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Negative money or stock.
    #[error("{field} cannot be negative")]
    MustBePositive { field: String },

    /// Emails, ids and `YYYY-MM-DD` dates.
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}
