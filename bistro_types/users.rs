use serde::{Deserialize, Serialize};

/// A registered user. The password is only ever the argon2 hash, and it is
/// scrubbed before a user leaves the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    password: String,
    pub email_verified: bool,
}

impl User {
    /// A user that has not been persisted yet (id `0`, email not verified).
    pub fn new(email: String, username: String, password: String) -> Self {
        Self {
            id: 0,
            email,
            username,
            password,
            email_verified: false,
        }
    }

    /// Rebuilds a user from storage.
    pub fn restore(
        id: i64,
        email: String,
        username: String,
        password: String,
        email_verified: bool,
    ) -> Self {
        Self {
            id,
            email,
            username,
            password,
            email_verified,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: String) {
        self.password = password;
    }

    pub fn protect_password(&mut self) {
        self.password.clear();
    }

    pub fn is_password_protected(&self) -> bool {
        self.password.is_empty()
    }
}
