use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::InviteGroupMembers, events::GroupMembersInvited},
    services::GroupsService,
    uow::{UnitOfWork, UnitOfWorkExt},
};

pub struct InviteGroupMembersCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl InviteGroupMembersCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for InviteGroupMembersCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<InviteGroupMembers> for InviteGroupMembersCommandHandler {
    async fn handle(&self, command: InviteGroupMembers) -> Result<(), ApplicationError> {
        let group = GroupsService::new(self.uow.clone())
            .get_group_by_id(command.group_id)
            .await?;
        if !group.is_owned_by(command.user.id) {
            return Err(DomainError::GroupOwner.into());
        }

        self.uow.add_event(GroupMembersInvited {
            group_id: group.id,
            group_name: group.name,
            group_owner_username: command.user.username,
            invited_group_members_emails: command.invited_group_members_emails,
        })
    }
}
