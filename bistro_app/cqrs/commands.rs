use bistro_types::{Group, User};

use crate::cqrs::Command;

// Users

#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterUser {
    pub fn new(email: String, username: String, password: String) -> Self {
        Self {
            email,
            username,
            password,
        }
    }
}

impl Command for RegisterUser {
    const NAME: &'static str = "RegisterUser";
    type Output = User;
}

/// `username` may hold either the username or the email of the user.
#[derive(Debug, Clone)]
pub struct VerifyUserCredentials {
    pub username: String,
    pub password: String,
}

impl Command for VerifyUserCredentials {
    const NAME: &'static str = "VerifyUserCredentials";
    type Output = User;
}

#[derive(Debug, Clone)]
pub struct VerifyUserEmail {
    pub user_id: i64,
}

impl Command for VerifyUserEmail {
    const NAME: &'static str = "VerifyUserEmail";
    type Output = User;
}

#[derive(Debug, Clone)]
pub struct GetUser {
    pub user_id: i64,
}

impl Command for GetUser {
    const NAME: &'static str = "GetUser";
    type Output = User;
}

// Groups

#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub name: String,
    pub user: User,
}

impl Command for CreateGroup {
    const NAME: &'static str = "CreateGroup";
    type Output = Group;
}

#[derive(Debug, Clone)]
pub struct UpdateGroup {
    pub group_id: i64,
    pub user: User,
    pub name: String,
}

impl Command for UpdateGroup {
    const NAME: &'static str = "UpdateGroup";
    type Output = Group;
}

#[derive(Debug, Clone)]
pub struct DeleteGroup {
    pub group_id: i64,
    pub user: User,
}

impl Command for DeleteGroup {
    const NAME: &'static str = "DeleteGroup";
    type Output = ();
}

#[derive(Debug, Clone)]
pub struct AddGroupMembers {
    pub group_id: i64,
    pub user: User,
    pub group_members: Vec<User>,
}

impl Command for AddGroupMembers {
    const NAME: &'static str = "AddGroupMembers";
    type Output = Group;
}

#[derive(Debug, Clone)]
pub struct RemoveGroupMembers {
    pub group_id: i64,
    pub user: User,
    pub group_members: Vec<User>,
}

impl Command for RemoveGroupMembers {
    const NAME: &'static str = "RemoveGroupMembers";
    type Output = Group;
}

/// Invites people who are not registered yet, by email.
#[derive(Debug, Clone)]
pub struct InviteGroupMembers {
    pub group_id: i64,
    pub user: User,
    pub invited_group_members_emails: Vec<String>,
}

impl Command for InviteGroupMembers {
    const NAME: &'static str = "InviteGroupMembers";
    type Output = ();
}
