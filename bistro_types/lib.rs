pub mod groups;
pub mod users;

pub use groups::{Group, GroupMember, GroupMembers};
pub use users::User;
