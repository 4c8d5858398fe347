use sqlx::FromRow;

use bistro_types::{Group, GroupMember, GroupMembers, User};

#[derive(Debug, FromRow, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password: String,
    pub email_verified: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::restore(
            row.id,
            row.email,
            row.username,
            row.password,
            row.email_verified,
        )
    }
}

#[derive(Debug, FromRow, Clone)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
}

impl GroupRow {
    /// Builds the group from its row and the membership rows that belong to it.
    pub fn into_group(self, members: &[GroupMemberRow]) -> Group {
        let members: GroupMembers = members
            .iter()
            .filter(|m| m.group_id == self.id)
            .map(|m| GroupMember::new(m.group_id, m.user_id))
            .collect();

        Group {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
            members,
        }
    }
}

#[derive(Debug, FromRow, Clone, Copy)]
pub struct GroupMemberRow {
    pub group_id: i64,
    pub user_id: i64,
}
