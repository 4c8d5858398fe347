use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::Group;

use crate::{
    bootstrap::{Dependencies, Inject},
    config::Config,
    cqrs::{CommandHandler, commands::CreateGroup},
    services::GroupsService,
    uow::UnitOfWork,
};

pub struct CreateGroupCommandHandler {
    uow: Arc<dyn UnitOfWork>,
    config: Arc<Config>,
}

impl CreateGroupCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>, config: Arc<Config>) -> Self {
        Self { uow, config }
    }
}

impl Inject for CreateGroupCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(
            dependencies.require::<dyn UnitOfWork>()?,
            dependencies.require::<Config>()?,
        ))
    }
}

#[async_trait::async_trait]
impl CommandHandler<CreateGroup> for CreateGroupCommandHandler {
    async fn handle(&self, command: CreateGroup) -> Result<Group, ApplicationError> {
        self.config.validate_group_name(&command.name)?;

        let groups_service = GroupsService::new(self.uow.clone());
        if groups_service
            .check_group_existence(command.user.id, &command.name)
            .await?
        {
            return Err(DomainError::GroupAlreadyExists.into());
        }

        groups_service
            .create_group(&Group::new(command.name, command.user.id))
            .await
    }
}
