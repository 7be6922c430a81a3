//! # Services
//!
//! Logic that spans more than one repository call. Plain CRUD handlers talk
//! to the repositories directly; anything involving credentials, ownership,
//! free-tier limits or cash-closing totals goes through here.

pub mod access;
pub mod accounts;
pub mod cash_closing;
pub mod limiter;

pub use limiter::{FeatureLimiter, Quota, UsageReport};
