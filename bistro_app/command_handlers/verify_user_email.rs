use std::sync::Arc;

use bistro_core::ApplicationError;
use bistro_types::User;

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::VerifyUserEmail},
    services::UsersService,
    uow::UnitOfWork,
};

pub struct VerifyUserEmailCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl VerifyUserEmailCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for VerifyUserEmailCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<VerifyUserEmail> for VerifyUserEmailCommandHandler {
    async fn handle(&self, command: VerifyUserEmail) -> Result<User, ApplicationError> {
        let users_service = UsersService::new(self.uow.clone());
        let mut user = users_service.verify_user_email(command.user_id).await?;
        user.protect_password();
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::DomainError;

    use crate::test_utils::tests::{MockStore, MockUnitOfWork, user_factory};

    #[tokio::test]
    async fn test_verify_user_email() {
        let store = MockStore::new();
        let user = store.seed_user(user_factory("alice", false));
        let handler =
            VerifyUserEmailCommandHandler::new(Arc::new(MockUnitOfWork::with_store(store.clone())));

        let verified = handler
            .handle(VerifyUserEmail { user_id: user.id })
            .await
            .unwrap();

        assert!(verified.email_verified);
        assert!(verified.is_password_protected());
        assert!(store.user(user.id).unwrap().email_verified);
    }

    #[tokio::test]
    async fn test_verify_missing_user() {
        let handler = VerifyUserEmailCommandHandler::new(Arc::new(MockUnitOfWork::new()));

        assert!(matches!(
            handler.handle(VerifyUserEmail { user_id: 5 }).await,
            Err(ApplicationError::Domain(DomainError::UserNotFound))
        ));
    }
}
