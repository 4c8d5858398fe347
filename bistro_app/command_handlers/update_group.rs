use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::Group;

use crate::{
    bootstrap::{Dependencies, Inject},
    config::Config,
    cqrs::{CommandHandler, commands::UpdateGroup},
    services::GroupsService,
    uow::UnitOfWork,
};

pub struct UpdateGroupCommandHandler {
    uow: Arc<dyn UnitOfWork>,
    config: Arc<Config>,
}

impl UpdateGroupCommandHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>, config: Arc<Config>) -> Self {
        Self { uow, config }
    }
}

impl Inject for UpdateGroupCommandHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(
            dependencies.require::<dyn UnitOfWork>()?,
            dependencies.require::<Config>()?,
        ))
    }
}

#[async_trait::async_trait]
impl CommandHandler<UpdateGroup> for UpdateGroupCommandHandler {
    async fn handle(&self, command: UpdateGroup) -> Result<Group, ApplicationError> {
        self.config.validate_group_name(&command.name)?;

        let groups_service = GroupsService::new(self.uow.clone());
        let mut group = groups_service.get_group_by_id(command.group_id).await?;
        if !group.is_owned_by(command.user.id) {
            return Err(DomainError::GroupOwner.into());
        }

        if group.name != command.name
            && groups_service
                .check_group_existence(group.owner_id, &command.name)
                .await?
        {
            return Err(DomainError::GroupAlreadyExists.into());
        }

        group.name = command.name;
        groups_service.update_group(group.id, &group).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{
        MockStore, MockUnitOfWork, group_factory, test_config, user_factory,
    };

    fn rename(group: &Group, user: &bistro_types::User, name: &str) -> UpdateGroup {
        UpdateGroup {
            group_id: group.id,
            user: user.clone(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_owner_renames_group() {
        let store = MockStore::new();
        let owner = store.seed_user(user_factory("owner", true));
        let member = store.seed_user(user_factory("member", true));
        let mut group = group_factory("Friends", &owner);
        group.members = group.members_from_user_ids([member.id]);
        let group = store.seed_group(group);
        let handler = UpdateGroupCommandHandler::new(
            Arc::new(MockUnitOfWork::with_store(store.clone())),
            test_config(),
        );

        let updated = handler.handle(rename(&group, &owner, "Family")).await.unwrap();

        assert_eq!(updated.name, "Family");
        assert_eq!(updated.members, group.members);
        assert_eq!(store.group(group.id).unwrap().name, "Family");
    }

    #[tokio::test]
    async fn test_only_owner_can_rename() {
        let store = MockStore::new();
        let owner = store.seed_user(user_factory("owner", true));
        let intruder = store.seed_user(user_factory("intruder", true));
        let group = store.seed_group(group_factory("Friends", &owner));
        let handler = UpdateGroupCommandHandler::new(
            Arc::new(MockUnitOfWork::with_store(store.clone())),
            test_config(),
        );

        assert!(matches!(
            handler.handle(rename(&group, &intruder, "Mine")).await,
            Err(ApplicationError::Domain(DomainError::GroupOwner))
        ));
        assert!(matches!(
            handler
                .handle(UpdateGroup {
                    group_id: 99,
                    user: owner,
                    name: "Mine".to_string(),
                })
                .await,
            Err(ApplicationError::Domain(DomainError::GroupNotFound(99)))
        ));
        assert_eq!(store.group(group.id).unwrap().name, "Friends");
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name() {
        let store = MockStore::new();
        let owner = store.seed_user(user_factory("owner", true));
        let group = store.seed_group(group_factory("Friends", &owner));
        store.seed_group(group_factory("Family", &owner));
        let handler = UpdateGroupCommandHandler::new(
            Arc::new(MockUnitOfWork::with_store(store)),
            test_config(),
        );

        assert!(matches!(
            handler.handle(rename(&group, &owner, "Family")).await,
            Err(ApplicationError::Domain(DomainError::GroupAlreadyExists))
        ));
        // Keeping the current name is not a conflict.
        handler.handle(rename(&group, &owner, "Friends")).await.unwrap();
    }
}
