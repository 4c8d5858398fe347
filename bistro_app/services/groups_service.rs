use std::sync::Arc;

use bistro_core::{ApplicationError, DomainError};
use bistro_types::{Group, GroupMembers};

use crate::uow::UnitOfWork;

/// Operations on groups, run through the Unit of Work it is given.
/// Writes commit on success.
pub struct GroupsService {
    uow: Arc<dyn UnitOfWork>,
}

impl GroupsService {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn get_group_by_id(&self, id: i64) -> Result<Group, ApplicationError> {
        self.uow
            .groups()
            .get(id)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(id).into())
    }

    pub async fn check_group_existence(
        &self,
        owner_id: i64,
        name: &str,
    ) -> Result<bool, ApplicationError> {
        Ok(self
            .uow
            .groups()
            .get_by_owner_and_name(owner_id, name)
            .await?
            .is_some())
    }

    pub async fn create_group(&self, group: &Group) -> Result<Group, ApplicationError> {
        let group = self.uow.groups().add(group).await?;
        self.uow.commit().await?;
        Ok(group)
    }

    pub async fn update_group(&self, id: i64, group: &Group) -> Result<Group, ApplicationError> {
        let group = self.uow.groups().update(id, group).await?;
        self.uow.commit().await?;
        Ok(group)
    }

    pub async fn delete_group(&self, id: i64) -> Result<(), ApplicationError> {
        self.uow.groups().delete(id).await?;
        self.uow.commit().await
    }

    /// Adds memberships of group `id` and returns the reloaded group.
    pub async fn add_group_members(
        &self,
        id: i64,
        members: &GroupMembers,
    ) -> Result<Group, ApplicationError> {
        self.uow.groups().add_members(members).await?;
        self.uow.commit().await?;
        self.get_group_by_id(id).await
    }

    /// Removes memberships of group `id` and returns the reloaded group.
    pub async fn remove_group_members(
        &self,
        id: i64,
        members: &GroupMembers,
    ) -> Result<Group, ApplicationError> {
        self.uow.groups().remove_members(members).await?;
        self.uow.commit().await?;
        self.get_group_by_id(id).await
    }

    pub async fn get_owner_groups(&self, owner_id: i64) -> Result<Vec<Group>, ApplicationError> {
        self.uow.groups().get_owner_groups(owner_id).await
    }
}
