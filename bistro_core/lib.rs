use thiserror::Error;

pub mod app_error;
pub mod db_error;
pub mod domain_error;

pub use app_error::AppError;
pub use db_error::DbError;
pub use domain_error::DomainError;

pub type Result<T, E = ApplicationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

/// Coarse classification of an error, used by entry points to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Validation,
    Unauthenticated,
    Internal,
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Domain(e) => e.kind(),
            ApplicationError::Db(DbError::UniqueViolation(_)) => ErrorKind::AlreadyExists,
            ApplicationError::App(AppError::UserAttributeRequired) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }
}
