use thiserror::Error;

/// Errors for app plumbing (message bus, injection, units of work, auth).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(&'static str),

    #[error("Command {0} already has a handler")]
    DuplicateCommandHandler(&'static str),

    #[error("Missing dependency {0}")]
    MissingDependency(&'static str),

    #[error("Expected message {expected}, got {found}")]
    MessageTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("No command result available")]
    MissingCommandResult,

    #[error("Command result is not a {0}")]
    CommandResultTypeMismatch(&'static str),

    #[error("Unit of work is closed")]
    UnitOfWorkClosed,

    #[error("At least one of id, email or username is required")]
    UserAttributeRequired,

    #[error(transparent)]
    PasswordHash(#[from] argon2::password_hash::Error),
}
