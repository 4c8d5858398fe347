mod group_members_added;
mod group_members_removed;
mod send_verify_email_message;

pub use group_members_added::GroupMembersAddedEventHandler;
pub use group_members_removed::GroupMembersRemovedEventHandler;
pub use send_verify_email_message::SendVerifyEmailMessageEventHandler;
