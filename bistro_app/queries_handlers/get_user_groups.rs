use async_trait::async_trait;
use std::sync::Arc;

use bistro_core::ApplicationError;

use crate::{
    cqrs::{Query, QueryHandler, queries::GetUserGroups},
    services::GroupsService,
    uow::UnitOfWork,
};

/// Groups owned by a user.
pub struct GetUserGroupsHandler {}

impl GetUserGroupsHandler {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl QueryHandler<GetUserGroups> for GetUserGroupsHandler {
    async fn handle(
        &self,
        query: GetUserGroups,
        uow: &Arc<dyn UnitOfWork>,
    ) -> Result<<GetUserGroups as Query>::Output, ApplicationError> {
        GroupsService::new(uow.clone())
            .get_owner_groups(query.user_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{MockStore, MockUnitOfWork, group_factory, user_factory};

    #[tokio::test]
    async fn test_lists_owned_groups_only() {
        let store = MockStore::new();
        let owner = store.seed_user(user_factory("owner", true));
        let other = store.seed_user(user_factory("other", true));
        store.seed_group(group_factory("Friends", &owner));
        store.seed_group(group_factory("Family", &owner));
        store.seed_group(group_factory("Work", &other));
        let uow: Arc<dyn UnitOfWork> = Arc::new(MockUnitOfWork::with_store(store));

        let groups = GetUserGroupsHandler::new()
            .handle(GetUserGroups { user_id: owner.id }, &uow)
            .await
            .unwrap();

        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Friends", "Family"]);
    }
}
