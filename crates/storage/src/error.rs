use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    pub fn is_check_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23514")
        )
    }

    /// Turns unique/foreign-key/check violations into a `ConstraintViolation`
    /// carrying `message`; other errors pass through untouched.
    pub fn constraint(self, message: impl Into<String>) -> Self {
        if self.is_unique_violation() || self.is_foreign_key_violation() || self.is_check_violation()
        {
            StorageError::ConstraintViolation(message.into())
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_passes_through_non_database_errors() {
        let err = StorageError::NotFound.constraint("bib already taken");
        assert!(matches!(err, StorageError::NotFound));
    }

    #[test]
    fn test_row_not_found_is_not_a_violation() {
        let err = StorageError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
        assert!(!err.is_check_violation());
    }
}
