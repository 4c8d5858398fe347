use serde::{Deserialize, Serialize};

use crate::cqrs::Event;

// Users

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl Event for UserRegistered {
    const NAME: &'static str = "UserRegistered";
}

// Groups

/// Member details are denormalized so subscribers don't need a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersAdded {
    pub group_id: i64,
    pub group_name: String,
    pub group_owner_username: String,
    pub group_members_usernames: Vec<String>,
    pub group_members_emails: Vec<String>,
}

impl Event for GroupMembersAdded {
    const NAME: &'static str = "GroupMembersAdded";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersRemoved {
    pub group_id: i64,
    pub group_name: String,
    pub group_owner_username: String,
    pub group_members_usernames: Vec<String>,
    pub group_members_emails: Vec<String>,
}

impl Event for GroupMembersRemoved {
    const NAME: &'static str = "GroupMembersRemoved";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersInvited {
    pub group_id: i64,
    pub group_name: String,
    pub group_owner_username: String,
    pub invited_group_members_emails: Vec<String>,
}

impl Event for GroupMembersInvited {
    const NAME: &'static str = "GroupMembersInvited";
}
