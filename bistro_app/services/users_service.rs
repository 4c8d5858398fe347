use std::sync::Arc;

use bistro_core::{AppError, ApplicationError, DomainError};
use bistro_types::User;

use crate::uow::UnitOfWork;

/// Attributes to look a user up by. At least one must be set.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserLookup<'a> {
    pub id: Option<i64>,
    pub email: Option<&'a str>,
    pub username: Option<&'a str>,
}

impl<'a> UserLookup<'a> {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_email(email: &'a str) -> Self {
        Self {
            email: Some(email),
            ..Self::default()
        }
    }

    pub fn by_username(username: &'a str) -> Self {
        Self {
            username: Some(username),
            ..Self::default()
        }
    }

    pub fn email(mut self, email: &'a str) -> Self {
        self.email = Some(email);
        self
    }

    pub fn username(mut self, username: &'a str) -> Self {
        self.username = Some(username);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.is_none() && self.username.is_none()
    }
}

/// Operations on users, run through the Unit of Work it is given.
pub struct UsersService {
    uow: Arc<dyn UnitOfWork>,
}

impl UsersService {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Stores a new user and commits.
    pub async fn register_user(&self, user: &User) -> Result<User, ApplicationError> {
        let user = self.uow.users().add(user).await?;
        self.uow.commit().await?;
        Ok(user)
    }

    /// True if any of the given attributes matches an existing user.
    pub async fn check_user_existence(
        &self,
        lookup: UserLookup<'_>,
    ) -> Result<bool, ApplicationError> {
        if lookup.is_empty() {
            return Err(AppError::UserAttributeRequired.into());
        }

        let users = self.uow.users();
        if let Some(id) = lookup.id {
            if users.get(id).await?.is_some() {
                return Ok(true);
            }
        }
        if let Some(email) = lookup.email {
            if users.get_by_email(email).await?.is_some() {
                return Ok(true);
            }
        }
        if let Some(username) = lookup.username {
            if users.get_by_username(username).await?.is_some() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, ApplicationError> {
        self.uow
            .users()
            .get(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ApplicationError> {
        self.uow
            .users()
            .get_by_email(email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, ApplicationError> {
        self.uow
            .users()
            .get_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    /// Marks the user's email as verified and commits.
    pub async fn verify_user_email(&self, id: i64) -> Result<User, ApplicationError> {
        let mut user = self.get_user_by_id(id).await?;
        user.email_verified = true;

        let user = self.uow.users().update(id, &user).await?;
        self.uow.commit().await?;
        Ok(user)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, ApplicationError> {
        self.uow.users().list().await
    }
}
