mod group_repository;
mod user_repository;

pub use group_repository::GroupRepository;
pub use user_repository::UserRepository;
