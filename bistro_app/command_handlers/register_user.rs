use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::User;

use crate::{
    auth::hash_password,
    bootstrap::{Dependencies, Inject},
    config::Config,
    cqrs::{CommandHandler, commands::RegisterUser, events::UserRegistered},
    services::{UserLookup, UsersService},
    uow::{UnitOfWork, UnitOfWorkExt},
};

pub struct RegisterUserCommandHandler {
    uow: Arc<dyn UnitOfWork>,
    config: Arc<Config>,
}

impl RegisterUserCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>, config: Arc<Config>) -> Self {
        Self { uow, config }
    }
}

impl Inject for RegisterUserCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(
            dependencies.require::<dyn UnitOfWork>()?,
            dependencies.require::<Config>()?,
        ))
    }
}

#[async_trait::async_trait]
impl CommandHandler<RegisterUser> for RegisterUserCommandHandler {
    async fn handle(&self, command: RegisterUser) -> Result<User, ApplicationError> {
        self.config.validate_password(&command.password)?;

        let users_service = UsersService::new(self.uow.clone());
        let lookup = UserLookup::by_email(&command.email).username(&command.username);
        if users_service.check_user_existence(lookup).await? {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let hashed_password = hash_password(&command.password)?;
        let user = User::new(command.email, command.username, hashed_password);

        let mut user = users_service.register_user(&user).await?;
        user.protect_password();

        self.uow.add_event(UserRegistered {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        })?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::test_utils::tests::{MockStore, MockUnitOfWork, test_config, user_factory};

    fn register(email: &str, username: &str, password: &str) -> RegisterUser {
        RegisterUser::new(email.to_string(), username.to_string(), password.to_string())
    }

    #[tokio::test]
    async fn test_register_user() {
        let store = MockStore::new();
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let handler = RegisterUserCommandHandler::new(uow.clone(), test_config());

        let user = handler
            .handle(register("a@b.com", "alice", "secret123"))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert!(!user.email_verified);
        assert!(user.is_password_protected());
        assert_eq!(uow.commits(), 1);

        let stored = store.user(1).unwrap();
        assert!(verify_password(stored.password(), "secret123").unwrap());

        let events = uow.events().drain();
        assert_eq!(events.len(), 1);
        let event = events[0].downcast_ref::<UserRegistered>().unwrap();
        assert_eq!(event.user_id, 1);
        assert_eq!(event.username, "alice");
        assert_eq!(event.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_register_user_with_taken_email_or_username() {
        let store = MockStore::new();
        store.seed_user(user_factory("alice", false));
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let handler = RegisterUserCommandHandler::new(uow.clone(), test_config());

        for command in [
            register("alice@bistro.test", "someone", "secret123"),
            register("someone@bistro.test", "alice", "secret123"),
        ] {
            match handler.handle(command).await {
                Err(ApplicationError::Domain(DomainError::UserAlreadyExists)) => {}
                other => panic!("Expected UserAlreadyExists, got: {:?}", other),
            }
        }

        assert!(uow.events().is_empty());
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn test_register_user_with_invalid_password() {
        let uow = Arc::new(MockUnitOfWork::new());
        let handler = RegisterUserCommandHandler::new(uow.clone(), test_config());

        let result = handler.handle(register("a@b.com", "alice", "short")).await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::PasswordValidation { min: 8, max: 30 }))
        ));
        assert!(uow.store().users().is_empty());
    }
}
