mod get_user_groups;

pub use get_user_groups::GetUserGroupsHandler;
