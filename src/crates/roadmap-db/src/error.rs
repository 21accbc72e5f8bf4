//! Database error types and conversions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("query error: {0}")]
    Query(String),
}

impl DbError {
    pub fn not_found(context: impl Into<String>) -> Self {
        DbError::NotFound(context.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound("no matching row".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::ConstraintViolation(db_err.message().to_string())
            }
            sqlx::Error::Migrate(e) => DbError::Migration(e.to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_helper_sets_variant() {
        let err = DbError::not_found("task_id=t1");
        assert!(err.is_not_found());
    }

    #[test]
    fn sqlx_row_not_found_converts() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }
}
