use bistro_core::ApplicationError;

use crate::{
    bootstrap::{Dependencies, Inject},
    cqrs::{EventHandler, events::GroupMembersAdded},
};

/// Subscriber of `GroupMembersAdded`. Notifying the added users is not wired yet,
/// the event is only traced.
#[derive(Debug, Default)]
pub struct GroupMembersAddedEventHandler {}

impl GroupMembersAddedEventHandler {
    pub fn new() -> Self {
        Self {}
    }
}

impl Inject for GroupMembersAddedEventHandler {
    fn inject(_: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new())
    }
}

#[async_trait::async_trait]
impl EventHandler<GroupMembersAdded> for GroupMembersAddedEventHandler {
    async fn handle(&self, event: &GroupMembersAdded) -> Result<(), ApplicationError> {
        tracing::debug!(
            group_id = event.group_id,
            members = ?event.group_members_usernames,
            "Group members added"
        );
        Ok(())
    }
}
