use std::sync::Arc;

use bistro_app::repository::UserRepository;
use bistro_core::{ApplicationError, DbError};
use bistro_types::User;

use crate::models::UserRow;
use crate::uow::PgSession;

#[derive(Clone)]
pub struct PostgresUserRepository {
    session: Arc<PgSession>,
}

impl PostgresUserRepository {
    pub fn new(session: Arc<PgSession>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUserRepository {
    async fn add(&self, user: &User) -> Result<User, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, username, password, email_verified)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, password, email_verified
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.password())
        .bind(user.email_verified)
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(row.into())
    }

    async fn get(&self, id: i64) -> Result<Option<User>, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password, email_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(row.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password, email_verified
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(row.map(Into::into))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password, email_verified
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(row.map(Into::into))
    }

    /// A scrubbed (empty) password keeps the stored hash.
    async fn update(&self, id: i64, user: &User) -> Result<User, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                email = $2,
                username = $3,
                password = COALESCE(NULLIF($4, ''), password),
                email_verified = $5
            WHERE id = $1
            RETURNING id, email, username, password, email_verified
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.password())
        .bind(user.email_verified)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?
        .ok_or(DbError::UserByIdNotFound(id))?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
        let mut tx = self.session.transaction().await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(DbError::from_sqlx)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password, email_verified
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
