//! # Accounts
//!
//! Registration, login, password change and waiter accounts.
//!
//! ## Login
//! ```text
//! email ──normalize──► users.get_by_email
//!                          │
//!            none ─────────┼──► verify_dummy_password ─────┐
//!                          ▼                               │
//!                  verify_password(hash) ── mismatch ──┐   │
//!                          │                           ▼   ▼
//!                          ▼                 401 "Invalid email or password"
//!                        User                (same answer, same argon2 cost)
//! ```

use serde::Deserialize;
use tracing::{info, warn};

use mesa_core::validation::{normalize_email, validate_name, validate_password};
use mesa_core::{Restaurant, User, UserRole};
use mesa_db::{Database, NewUser};

use crate::error::{ApiError, ApiResult};
use crate::password::{hash_password, verify_dummy_password, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    /// `admin` (default) or `customer`. Waiter accounts are created by a
    /// restaurant owner, never by self-registration.
    #[serde(default)]
    pub role: Option<UserRole>,
}

pub async fn register(db: &Database, account: NewAccount) -> ApiResult<User> {
    let role = account.role.unwrap_or_default();
    if role == UserRole::Waiter {
        return Err(ApiError::invalid_input(
            "Waiter accounts are created by the restaurant owner",
        ));
    }
    create_account(db, account, role, None).await
}

/// Creates a waiter attached to `restaurant`. The limiter check is the
/// caller's job.
pub async fn create_waiter(
    db: &Database,
    restaurant: &Restaurant,
    account: NewAccount,
) -> ApiResult<User> {
    create_account(db, account, UserRole::Waiter, Some(restaurant.id.clone())).await
}

async fn create_account(
    db: &Database,
    account: NewAccount,
    role: UserRole,
    restaurant_id: Option<String>,
) -> ApiResult<User> {
    let name = validate_name("name", &account.name)?;
    let email = normalize_email(&account.email)?;
    validate_password(&account.password)?;

    if db.users().get_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "An account with email {} already exists",
            email
        )));
    }

    let password_hash = hash_password(account.password).await?;

    // A concurrent registration that wins the race surfaces as a unique
    // violation, which maps to 409 as well.
    let user = db
        .users()
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
            phone: account.phone,
            restaurant_id,
        })
        .await?;

    info!(user_id = %user.id, role = ?user.role, "Account created");
    Ok(user)
}

pub async fn login(db: &Database, email: &str, password: &str) -> ApiResult<User> {
    let Ok(email) = normalize_email(email) else {
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    };

    let Some(user) = db.users().get_by_email(&email).await? else {
        verify_dummy_password(password.to_string()).await?;
        warn!("Login failed: unknown email");
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    };

    if !verify_password(password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, "Login succeeded");
    Ok(user)
}

pub async fn get_account(db: &Database, user_id: &str) -> ApiResult<User> {
    db.users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))
}

/// Re-verifies the current password before storing a hash of the new one.
pub async fn change_password(
    db: &Database,
    user_id: &str,
    current_password: &str,
    new_password: &str,
) -> ApiResult<()> {
    validate_password(new_password)?;

    let user = get_account(db, user_id).await?;
    if !verify_password(current_password.to_string(), user.password_hash.clone()).await? {
        return Err(ApiError::unauthenticated("Current password is incorrect"));
    }

    let hash = hash_password(new_password.to_string()).await?;
    db.users().update_password(&user.id, &hash).await?;

    info!(user_id = %user.id, "Password changed");
    Ok(())
}
