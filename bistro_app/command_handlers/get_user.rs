use std::sync::Arc;

use bistro_core::ApplicationError;
use bistro_types::User;

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::GetUser},
    services::UsersService,
    uow::UnitOfWork,
};

pub struct GetUserCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl GetUserCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for GetUserCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<GetUser> for GetUserCommandHandler {
    async fn handle(&self, command: GetUser) -> Result<User, ApplicationError> {
        let mut user = UsersService::new(self.uow.clone())
            .get_user_by_id(command.user_id)
            .await?;
        user.protect_password();
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{MockStore, MockUnitOfWork, user_factory};

    #[tokio::test]
    async fn test_get_user_scrubs_password() {
        let store = MockStore::new();
        let seeded = store.seed_user(user_factory("alice", true));
        let handler = GetUserCommandHandler::new(Arc::new(MockUnitOfWork::with_store(store)));

        let user = handler.handle(GetUser { user_id: seeded.id }).await.unwrap();

        assert_eq!(user.email, "alice@bistro.test");
        assert!(user.is_password_protected());
    }
}
