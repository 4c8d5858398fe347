use bistro_core::ApplicationError;
use bistro_types::User;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user and returns it with its assigned id.
    async fn add(&self, user: &User) -> Result<User, ApplicationError>;

    async fn get(&self, id: i64) -> Result<Option<User>, ApplicationError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApplicationError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, ApplicationError>;

    async fn update(&self, id: i64, user: &User) -> Result<User, ApplicationError>;

    async fn delete(&self, id: i64) -> Result<(), ApplicationError>;

    async fn list(&self) -> Result<Vec<User>, ApplicationError>;
}
