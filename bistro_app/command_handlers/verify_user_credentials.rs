use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::User;

use crate::{
    auth::verify_password,
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::VerifyUserCredentials},
    services::{UserLookup, UsersService},
    uow::UnitOfWork,
};

pub struct VerifyUserCredentialsCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl VerifyUserCredentialsCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for VerifyUserCredentialsCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<VerifyUserCredentials> for VerifyUserCredentialsCommandHandler {
    async fn handle(&self, command: VerifyUserCredentials) -> Result<User, ApplicationError> {
        let users_service = UsersService::new(self.uow.clone());

        // The login may be either the email or the username.
        let mut user = if users_service
            .check_user_existence(UserLookup::by_email(&command.username))
            .await?
        {
            users_service.get_user_by_email(&command.username).await?
        } else if users_service
            .check_user_existence(UserLookup::by_username(&command.username))
            .await?
        {
            users_service.get_user_by_username(&command.username).await?
        } else {
            return Err(DomainError::UserNotFound.into());
        };

        if !user.email_verified {
            return Err(DomainError::EmailIsNotVerified.into());
        }

        if !verify_password(user.password(), &command.password)? {
            return Err(DomainError::InvalidPassword.into());
        }

        user.protect_password();
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{MockStore, MockUnitOfWork, TEST_PASSWORD, user_factory};

    fn setup(email_verified: bool) -> VerifyUserCredentialsCommandHandler {
        let store = MockStore::new();
        store.seed_user(user_factory("alice", email_verified));
        VerifyUserCredentialsCommandHandler::new(Arc::new(MockUnitOfWork::with_store(store)))
    }

    fn credentials(username: &str, password: &str) -> VerifyUserCredentials {
        VerifyUserCredentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let handler = setup(true);

        for login in ["alice", "alice@bistro.test"] {
            let user = handler
                .handle(credentials(login, TEST_PASSWORD))
                .await
                .unwrap();
            assert_eq!(user.username, "alice");
            assert!(user.is_password_protected());
        }
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let handler = setup(true);

        assert!(matches!(
            handler.handle(credentials("alice", "wrong-password")).await,
            Err(ApplicationError::Domain(DomainError::InvalidPassword))
        ));
    }

    #[tokio::test]
    async fn test_unverified_email_and_unknown_user() {
        let handler = setup(false);

        assert!(matches!(
            handler.handle(credentials("alice", TEST_PASSWORD)).await,
            Err(ApplicationError::Domain(DomainError::EmailIsNotVerified))
        ));
        assert!(matches!(
            handler.handle(credentials("bob", TEST_PASSWORD)).await,
            Err(ApplicationError::Domain(DomainError::UserNotFound))
        ));
    }
}
