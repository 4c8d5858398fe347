use thiserror::Error;

use crate::ErrorKind;

/// Errors for domain logic (business rules of users and groups).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User with provided credentials already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Email is not verified")]
    EmailIsNotVerified,

    #[error("Password must be between {min} and {max} characters")]
    PasswordValidation { min: usize, max: usize },

    #[error("Group with provided name already exists for current user")]
    GroupAlreadyExists,

    #[error("Group {0} not found")]
    GroupNotFound(i64),

    #[error("Group does not belong to current user")]
    GroupOwner,

    #[error("Group name must be between {min} and {max} characters inclusive")]
    GroupNameValidation { min: usize, max: usize },
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::UserAlreadyExists | DomainError::GroupAlreadyExists => {
                ErrorKind::AlreadyExists
            }
            DomainError::UserNotFound | DomainError::GroupNotFound(_) => ErrorKind::NotFound,
            DomainError::GroupOwner => ErrorKind::PermissionDenied,
            DomainError::InvalidPassword | DomainError::EmailIsNotVerified => {
                ErrorKind::Unauthenticated
            }
            DomainError::PasswordValidation { .. } | DomainError::GroupNameValidation { .. } => {
                ErrorKind::Validation
            }
        }
    }
}
