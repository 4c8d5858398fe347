use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::DeleteGroup},
    services::GroupsService,
    uow::UnitOfWork,
};

pub struct DeleteGroupCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl DeleteGroupCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for DeleteGroupCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<DeleteGroup> for DeleteGroupCommandHandler {
    async fn handle(&self, command: DeleteGroup) -> Result<(), ApplicationError> {
        let groups_service = GroupsService::new(self.uow.clone());
        let group = groups_service.get_group_by_id(command.group_id).await?;
        if !group.is_owned_by(command.user.id) {
            return Err(DomainError::GroupOwner.into());
        }

        groups_service.delete_group(group.id).await
    }
}
