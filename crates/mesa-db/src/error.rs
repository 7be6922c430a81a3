//! # Database Errors
//!
//! Every repository method returns [`DbResult`]. SQLite constraint failures
//! are classified by sqlx's [`ErrorKind`] so the API layer can answer 409 or
//! 400 without parsing messages:
//!
//! ```text
//! sqlx::Error::RowNotFound                  ─► NotFound
//! Database(kind = UniqueViolation)          ─► UniqueViolation   (409)
//! Database(kind = ForeignKeyViolation)      ─► ForeignKeyViolation (400)
//! Database(kind = Check / NotNull)          ─► CheckViolation    (400)
//! PoolTimedOut                              ─► PoolExhausted
//! anything else                             ─► Sqlx (500)
//! ```
//!
//! Repositories that know which column is unique (users.email, the table
//! number, the closing day) replace the generic `UniqueViolation` with
//! [`DbError::duplicate`].

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// ## When This Occurs
    /// - Registering an email that already exists
    /// - Two tables with the same number in one restaurant
    /// - A second cash closing for the same restaurant and day
    #[error("{field} '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row points at a restaurant, owner or order that is gone.
    #[error("Referenced row missing: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK or NOT NULL constraint rejected the row (negative price,
    /// zero quantity). Input validation normally catches these first.
    #[error("Constraint failed: {0}")]
    CheckViolation(String),

    #[error("Cannot open database: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// A unique column clash with the offending value spelled out.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// `"UNIQUE constraint failed: users.email"` ─► `"users.email"`.
fn constrained_columns(message: &str) -> String {
    message
        .split_once(": ")
        .map(|(_, columns)| columns.to_string())
        .unwrap_or_else(|| message.to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let constraint = match &err {
            sqlx::Error::RowNotFound => return DbError::not_found("Row", "unknown"),
            sqlx::Error::PoolTimedOut => return DbError::PoolExhausted,
            sqlx::Error::PoolClosed => {
                return DbError::ConnectionFailed("pool is closed".to_string())
            }
            sqlx::Error::Database(db_err) => Some((db_err.kind(), db_err.message().to_string())),
            _ => None,
        };

        match constraint {
            Some((ErrorKind::UniqueViolation, message)) => DbError::UniqueViolation {
                field: constrained_columns(&message),
                value: "unknown".to_string(),
            },
            Some((ErrorKind::ForeignKeyViolation, message)) => {
                DbError::ForeignKeyViolation { message }
            }
            Some((ErrorKind::CheckViolation | ErrorKind::NotNullViolation, message)) => {
                DbError::CheckViolation(message)
            }
            _ => DbError::Sqlx(err),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));
    }

    #[test]
    fn test_duplicate_message() {
        let err = DbError::duplicate("email", "ana@example.com");
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "email 'ana@example.com' already exists");
    }

    #[test]
    fn test_constrained_columns() {
        assert_eq!(
            constrained_columns("UNIQUE constraint failed: tables.restaurant_id, tables.number"),
            "tables.restaurant_id, tables.number"
        );
        assert_eq!(constrained_columns("odd"), "odd");
    }
}
