use bistro_core::ApplicationError;
use bistro_types::{Group, GroupMembers};

#[async_trait::async_trait]
pub trait GroupRepository: Send + Sync {
    /// Inserts a group (without members) and returns it with its assigned id.
    async fn add(&self, group: &Group) -> Result<Group, ApplicationError>;

    /// Loads a group together with its members.
    async fn get(&self, id: i64) -> Result<Option<Group>, ApplicationError>;

    async fn get_by_owner_and_name(
        &self,
        owner_id: i64,
        name: &str,
    ) -> Result<Option<Group>, ApplicationError>;

    async fn get_owner_groups(&self, owner_id: i64) -> Result<Vec<Group>, ApplicationError>;

    /// Updates name and owner. Members are managed with `add_members`/`remove_members`.
    async fn update(&self, id: i64, group: &Group) -> Result<Group, ApplicationError>;

    /// Deletes a group and its memberships.
    async fn delete(&self, id: i64) -> Result<(), ApplicationError>;

    /// Adds memberships; already existing ones are left untouched.
    async fn add_members(&self, members: &GroupMembers) -> Result<(), ApplicationError>;

    /// Removes memberships; missing ones are ignored.
    async fn remove_members(&self, members: &GroupMembers) -> Result<(), ApplicationError>;

    async fn list(&self) -> Result<Vec<Group>, ApplicationError>;
}
