//! # Feature Limiter
//!
//! Gates creation of counted resources on the free tier.
//!
//! ## Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  can_create(subscriber, quota, extra)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subscriptions.get_by_user(subscriber)                                  │
//! │       │  lookup error ──► treat as Free                                 │
//! │       ▼                                                                 │
//! │  Tier::from_subscription ── Paid ──► allow                              │
//! │       │ Free                                                            │
//! │       ▼                                                                 │
//! │  live count in the quota's scope                                        │
//! │       │  count error ──► deny                                           │
//! │       ▼                                                                 │
//! │  count + extra <= free_tier_limit ? allow : deny                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The subscriber is the account whose plan pays for the resource: the
//! restaurant owner, even when a waiter takes the order.
//!
//! Check and insert are separate statements, so two concurrent creations
//! can both pass the check and overshoot the limit by one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use mesa_core::limits::{is_within_limit, month_bounds, ResourceUsage};
use mesa_core::{ResourceKind, Tier, UserRole};
use mesa_db::{Database, DbResult};

use crate::error::{ApiError, ApiResult};

/// A counted resource together with the scope its count is taken in.
#[derive(Debug, Clone, Copy)]
pub enum Quota<'a> {
    Restaurants { owner_id: &'a str },
    MenuItems { restaurant_id: &'a str },
    RawIngredients { restaurant_id: &'a str },
    Orders { restaurant_id: &'a str },
    WaiterAccounts { restaurant_id: &'a str },
    /// Closings in the calendar month containing `date`.
    CashClosings { restaurant_id: &'a str, date: NaiveDate },
}

impl Quota<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Quota::Restaurants { .. } => ResourceKind::Restaurants,
            Quota::MenuItems { .. } => ResourceKind::MenuItems,
            Quota::RawIngredients { .. } => ResourceKind::RawIngredients,
            Quota::Orders { .. } => ResourceKind::Orders,
            Quota::WaiterAccounts { .. } => ResourceKind::WaiterAccounts,
            Quota::CashClosings { .. } => ResourceKind::CashClosings,
        }
    }
}

/// Usage of every counted resource for one account (and optionally one of
/// its restaurants).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub tier: Tier,
    pub resources: Vec<ResourceUsage>,
}

#[derive(Debug, Clone)]
pub struct FeatureLimiter {
    db: Database,
}

impl FeatureLimiter {
    pub fn new(db: Database) -> Self {
        FeatureLimiter { db }
    }

    /// Plan of `subscriber_id` at `now`. A failed lookup is the free tier.
    pub async fn tier(&self, subscriber_id: &str, now: DateTime<Utc>) -> Tier {
        match self.db.subscriptions().get_by_user(subscriber_id).await {
            Ok(subscription) => Tier::from_subscription(subscription.as_ref(), now),
            Err(e) => {
                warn!(subscriber_id = %subscriber_id, error = %e, "Subscription lookup failed, assuming free tier");
                Tier::Free
            }
        }
    }

    async fn count(&self, quota: Quota<'_>) -> DbResult<i64> {
        match quota {
            Quota::Restaurants { owner_id } => self.db.restaurants().count_by_owner(owner_id).await,
            Quota::MenuItems { restaurant_id } => {
                self.db.menu_items().count_by_restaurant(restaurant_id).await
            }
            Quota::RawIngredients { restaurant_id } => {
                self.db.raw_ingredients().count_by_restaurant(restaurant_id).await
            }
            Quota::Orders { restaurant_id } => {
                self.db.orders().count_by_restaurant(restaurant_id).await
            }
            Quota::WaiterAccounts { restaurant_id } => {
                self.db
                    .users()
                    .count_by_restaurant_role(restaurant_id, UserRole::Waiter)
                    .await
            }
            Quota::CashClosings {
                restaurant_id,
                date,
            } => {
                let (from, until) = month_bounds(date);
                self.db
                    .cash_closings()
                    .count_in_range(restaurant_id, from, until)
                    .await
            }
        }
    }

    /// Whether `extra` more rows may be created. Never fails: errors resolve
    /// to free tier for the plan lookup and to "deny" for the count.
    pub async fn can_create(&self, subscriber_id: &str, quota: Quota<'_>, extra: i64) -> bool {
        if self.tier(subscriber_id, Utc::now()).await == Tier::Paid {
            return true;
        }

        let kind = quota.kind();
        match self.count(quota).await {
            Ok(count) => {
                let allowed = is_within_limit(kind, count, extra);
                debug!(resource = %kind, count, extra, allowed, "Free tier check");
                allowed
            }
            Err(e) => {
                error!(resource = %kind, error = %e, "Usage count failed, denying creation");
                false
            }
        }
    }

    /// [`can_create`](Self::can_create) as a `Result`, rejecting with
    /// `LIMIT_EXCEEDED`.
    pub async fn ensure_can_create(
        &self,
        subscriber_id: &str,
        quota: Quota<'_>,
        extra: i64,
    ) -> ApiResult<()> {
        if self.can_create(subscriber_id, quota, extra).await {
            Ok(())
        } else {
            warn!(subscriber_id = %subscriber_id, resource = %quota.kind(), extra, "Free plan limit reached");
            Err(ApiError::limit_exceeded(quota.kind()))
        }
    }

    /// Counts and limits for `subscriber_id`. Restaurant-scoped resources are
    /// only reported when `restaurant_id` is given; cash closings count the
    /// month containing `today`.
    pub async fn usage(
        &self,
        subscriber_id: &str,
        restaurant_id: Option<&str>,
        today: NaiveDate,
    ) -> ApiResult<UsageReport> {
        let tier = self.tier(subscriber_id, Utc::now()).await;

        let mut quotas = vec![Quota::Restaurants {
            owner_id: subscriber_id,
        }];
        if let Some(restaurant_id) = restaurant_id {
            quotas.extend([
                Quota::MenuItems { restaurant_id },
                Quota::RawIngredients { restaurant_id },
                Quota::Orders { restaurant_id },
                Quota::CashClosings {
                    restaurant_id,
                    date: today,
                },
                Quota::WaiterAccounts { restaurant_id },
            ]);
        }

        let mut resources = Vec::with_capacity(quotas.len());
        for quota in quotas {
            let count = self.count(quota).await?;
            resources.push(ResourceUsage::new(quota.kind(), count, tier));
        }

        Ok(UsageReport { tier, resources })
    }
}
