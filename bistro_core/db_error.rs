use thiserror::Error;

/// Errors for db stuff.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("User with ID {0} not found")]
    UserByIdNotFound(i64),

    #[error("Group with ID {0} not found")]
    GroupByIdNotFound(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("{0} must be set")]
    MissingDatabaseUrl(&'static str),
}

impl DbError {
    /// Maps a driver error, keeping unique violations (SQLSTATE 23505) distinguishable.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return DbError::UniqueViolation(constraint);
            }
        }
        DbError::Database(err)
    }
}
