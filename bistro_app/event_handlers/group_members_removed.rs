use bistro_core::ApplicationError;

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{EventHandler, events::GroupMembersRemoved},
};

/// Subscriber of `GroupMembersRemoved`. Only traces the event for now.
#[derive(Debug, Default)]
pub struct GroupMembersRemovedEventHandler {}

impl GroupMembersRemovedEventHandler {
    pub fn new() -> Self {
        Self {}
    }
}

impl Inject for GroupMembersRemovedEventHandler {
    fn inject(_: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new())
    }
}

#[async_trait::async_trait]
impl EventHandler<GroupMembersRemoved> for GroupMembersRemovedEventHandler {
    async fn handle(&self, event: &GroupMembersRemoved) -> Result<(), ApplicationError> {
        tracing::debug!(
            group_id = event.group_id,
            members = ?event.group_members_usernames,
            "Group members removed"
        );
        Ok(())
    }
}
