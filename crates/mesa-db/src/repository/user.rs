//! # User Repository
//!
//! Credential store: accounts with their password hash. Also holds waiter
//! staff, which are ordinary accounts with role `waiter` attached to a
//! restaurant.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use mesa_core::{User, UserRole};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone, avatar_url, \
                            restaurant_id, created_at, updated_at";

/// Fields for a new account. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub restaurant_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the email is taken
    pub async fn create(&self, new: NewUser) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            id: new_id(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            phone: new.phone,
            avatar_url: None,
            restaurant_id: new.restaurant_id,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, role = ?user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role,
                phone, avatar_url, restaurant_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.avatar_url)
        .bind(&user.restaurant_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &user.email),
            other => other,
        })?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Looks up an account by its normalized email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Replaces the stored password hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating password hash");

        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Accounts of one role attached to a restaurant, oldest first.
    pub async fn list_by_restaurant_role(
        &self,
        restaurant_id: &str,
        role: UserRole,
    ) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE restaurant_id = ?1 AND role = ?2 ORDER BY created_at"
        ))
        .bind(restaurant_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count_by_restaurant_role(
        &self,
        restaurant_id: &str,
        role: UserRole,
    ) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE restaurant_id = ?1 AND role = ?2")
                .bind(restaurant_id)
                .bind(role)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$fake".to_string(),
            role: UserRole::Admin,
            phone: Some("555-0100".to_string()),
            restaurant_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_support::db().await;
        let created = db.users().create(new_user("ana@example.com")).await.unwrap();

        let by_email = db.users().get_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.password_hash, "$argon2id$v=19$fake");
        assert_eq!(by_email.role, UserRole::Admin);

        let by_id = db.users().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ana@example.com");

        assert!(db.users().get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = test_support::db().await;
        db.users().create(new_user("dup@example.com")).await.unwrap();

        let err = db.users().create(new_user("dup@example.com")).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_update_password() {
        let db = test_support::db().await;
        let user = db.users().create(new_user("pw@example.com")).await.unwrap();

        db.users().update_password(&user.id, "new-hash").await.unwrap();
        let reloaded = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");

        let err = db.users().update_password("missing", "x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_waiters_by_restaurant() {
        let db = test_support::db().await;
        let (_, restaurant) = test_support::restaurant(&db).await;

        for i in 0..2 {
            let mut waiter = new_user(&format!("waiter{i}@example.com"));
            waiter.role = UserRole::Waiter;
            waiter.restaurant_id = Some(restaurant.id.clone());
            db.users().create(waiter).await.unwrap();
        }

        let count = db
            .users()
            .count_by_restaurant_role(&restaurant.id, UserRole::Waiter)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let waiters = db
            .users()
            .list_by_restaurant_role(&restaurant.id, UserRole::Waiter)
            .await
            .unwrap();
        assert!(waiters.iter().all(|w| w.role == UserRole::Waiter));
    }
}
