use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::Group;

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::RemoveGroupMembers, events::GroupMembersRemoved},
    services::GroupsService,
    uow::{UnitOfWork, UnitOfWorkExt},
};

pub struct RemoveGroupMembersCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl RemoveGroupMembersCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for RemoveGroupMembersCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<RemoveGroupMembers> for RemoveGroupMembersCommandHandler {
    async fn handle(&self, command: RemoveGroupMembers) -> Result<Group, ApplicationError> {
        let groups_service = GroupsService::new(self.uow.clone());
        let group = groups_service.get_group_by_id(command.group_id).await?;
        if !group.is_owned_by(command.user.id) {
            return Err(DomainError::GroupOwner.into());
        }

        let members = group.members_from_user_ids(command.group_members.iter().map(|u| u.id));
        let group = groups_service
            .remove_group_members(group.id, &members)
            .await?;

        self.uow.add_event(GroupMembersRemoved {
            group_id: group.id,
            group_name: group.name.clone(),
            group_owner_username: command.user.username,
            group_members_usernames: command
                .group_members
                .iter()
                .map(|u| u.username.clone())
                .collect(),
            group_members_emails: command
                .group_members
                .iter()
                .map(|u| u.email.clone())
                .collect(),
        })?;

        Ok(group)
    }
}
