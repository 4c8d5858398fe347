use bistro_core::ApplicationError;

use crate::{
    command_handlers::*,
    cqrs::{commands::*, events::*},
    event_handlers::*,
    registry::{HandlerRegistry, HandlerRegistryBuilder},
};

pub fn users_registry() -> HandlerRegistryBuilder {
    HandlerRegistry::builder()
        .command::<RegisterUser, RegisterUserCommandHandler>()
        .command::<VerifyUserCredentials, VerifyUserCredentialsCommandHandler>()
        .command::<VerifyUserEmail, VerifyUserEmailCommandHandler>()
        .command::<GetUser, GetUserCommandHandler>()
        .event::<UserRegistered, SendVerifyEmailMessageEventHandler>()
}

pub fn groups_registry() -> HandlerRegistryBuilder {
    HandlerRegistry::builder()
        .command::<CreateGroup, CreateGroupCommandHandler>()
        .command::<UpdateGroup, UpdateGroupCommandHandler>()
        .command::<DeleteGroup, DeleteGroupCommandHandler>()
        .command::<AddGroupMembers, AddGroupMembersCommandHandler>()
        .command::<RemoveGroupMembers, RemoveGroupMembersCommandHandler>()
        .command::<InviteGroupMembers, InviteGroupMembersCommandHandler>()
        .event::<GroupMembersAdded, GroupMembersAddedEventHandler>()
        .event::<GroupMembersRemoved, GroupMembersRemovedEventHandler>()
        .declare_event::<GroupMembersInvited>()
}

/// Every handler of the application, ready to be shared by all requests.
pub fn app_registry() -> Result<HandlerRegistry, ApplicationError> {
    users_registry().merge(groups_registry()).build()
}
