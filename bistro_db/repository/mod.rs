mod group_repository;
mod user_repository;

pub use group_repository::PostgresGroupRepository;
pub use user_repository::PostgresUserRepository;
