mod groups_service;
mod users_service;

pub use groups_service::GroupsService;
pub use users_service::{UserLookup, UsersService};
