use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::Group;

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{CommandHandler, commands::AddGroupMembers, events::GroupMembersAdded},
    services::GroupsService,
    uow::{UnitOfWork, UnitOfWorkExt},
};

pub struct AddGroupMembersCommandHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl AddGroupMembersCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

impl Inject for AddGroupMembersCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(dependencies.require::<dyn UnitOfWork>()?))
    }
}

#[async_trait::async_trait]
impl CommandHandler<AddGroupMembers> for AddGroupMembersCommandHandler {
    async fn handle(&self, command: AddGroupMembers) -> Result<Group, ApplicationError> {
        let groups_service = GroupsService::new(self.uow.clone());
        let group = groups_service.get_group_by_id(command.group_id).await?;
        if !group.is_owned_by(command.user.id) {
            return Err(DomainError::GroupOwner.into());
        }

        let members = group.members_from_user_ids(command.group_members.iter().map(|u| u.id));
        let group = groups_service.add_group_members(group.id, &members).await?;

        self.uow.add_event(GroupMembersAdded {
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

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_types::GroupMember;

    use crate::test_utils::tests::{MockStore, MockUnitOfWork, group_factory, user_factory};

    #[tokio::test]
    async fn test_add_members_is_idempotent() {
        let store = MockStore::new();
        let owner = store.seed_user(user_factory("owner", true));
        let bob = store.seed_user(user_factory("bob", true));
        let carol = store.seed_user(user_factory("carol", true));
        let group = store.seed_group(group_factory("Friends", &owner));
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let handler = AddGroupMembersCommandHandler::new(uow.clone());

        let command = AddGroupMembers {
            group_id: group.id,
            user: owner.clone(),
            group_members: vec![bob.clone(), carol.clone()],
        };
        handler.handle(command.clone()).await.unwrap();
        let updated = handler.handle(command).await.unwrap();

        assert_eq!(updated.members.len(), 2);
        assert!(updated.members.contains(&GroupMember::new(group.id, bob.id)));
        assert!(updated.members.contains(&GroupMember::new(group.id, carol.id)));
        assert_eq!(store.group(group.id).unwrap().members, updated.members);

        let events = uow.events().drain();
        assert_eq!(events.len(), 2);
        let event = events[1].downcast_ref::<GroupMembersAdded>().unwrap();
        assert_eq!(event.group_name, "Friends");
        assert_eq!(event.group_owner_username, "owner");
        assert_eq!(event.group_members_usernames, vec!["bob", "carol"]);
        assert_eq!(
            event.group_members_emails,
            vec!["bob@bistro.test", "carol@bistro.test"]
        );
    }

    #[tokio::test]
    async fn test_only_owner_adds_members() {
        let store = MockStore::new();
        let owner = store.seed_user(user_factory("owner", true));
        let intruder = store.seed_user(user_factory("intruder", true));
        let group = store.seed_group(group_factory("Friends", &owner));
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let handler = AddGroupMembersCommandHandler::new(uow.clone());

        let result = handler
            .handle(AddGroupMembers {
                group_id: group.id,
                user: intruder.clone(),
                group_members: vec![intruder],
            })
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::GroupOwner))
        ));
        assert!(uow.events().is_empty());
        assert!(store.group(group.id).unwrap().members.is_empty());
    }
}
