mod add_group_members;
mod create_group;
mod delete_group;
mod get_user;
mod invite_group_members;
mod register_user;
mod remove_group_members;
mod update_group;
mod verify_user_credentials;
mod verify_user_email;

pub use add_group_members::AddGroupMembersCommandHandler;
pub use create_group::CreateGroupCommandHandler;
pub use delete_group::DeleteGroupCommandHandler;
pub use get_user::GetUserCommandHandler;
pub use invite_group_members::InviteGroupMembersCommandHandler;
pub use register_user::RegisterUserCommandHandler;
pub use remove_group_members::RemoveGroupMembersCommandHandler;
pub use update_group::UpdateGroupCommandHandler;
pub use verify_user_credentials::VerifyUserCredentialsCommandHandler;
pub use verify_user_email::VerifyUserEmailCommandHandler;
