use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Membership of a user in a group, keyed by the `(group_id, user_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: i64,
    pub user_id: i64,
}

impl GroupMember {
    pub fn new(group_id: i64, user_id: i64) -> Self {
        Self { group_id, user_id }
    }
}

/// The members of a group. Adding or removing the same member twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupMembers(BTreeSet<GroupMember>);

impl GroupMembers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the member was not already present.
    pub fn add(&mut self, member: GroupMember) -> bool {
        self.0.insert(member)
    }

    /// Returns `true` if the member was present.
    pub fn remove(&mut self, member: &GroupMember) -> bool {
        self.0.remove(member)
    }

    pub fn extend(&mut self, members: impl IntoIterator<Item = GroupMember>) {
        self.0.extend(members);
    }

    pub fn retain_absent_from(&mut self, members: &GroupMembers) {
        self.0.retain(|m| !members.contains(m));
    }

    pub fn contains(&self, member: &GroupMember) -> bool {
        self.0.contains(member)
    }

    pub fn contains_user(&self, user_id: i64) -> bool {
        self.0.iter().any(|m| m.user_id == user_id)
    }

    pub fn user_ids(&self) -> Vec<i64> {
        self.0.iter().map(|m| m.user_id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupMember> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<GroupMember> for GroupMembers {
    fn from_iter<T: IntoIterator<Item = GroupMember>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for GroupMembers {
    type Item = GroupMember;
    type IntoIter = <BTreeSet<GroupMember> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a GroupMembers {
    type Item = &'a GroupMember;
    type IntoIter = std::collections::btree_set::Iter<'a, GroupMember>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub members: GroupMembers,
}

impl Group {
    /// A group that has not been persisted yet (id `0`, no members).
    pub fn new(name: String, owner_id: i64) -> Self {
        Self {
            id: 0,
            name,
            owner_id,
            members: GroupMembers::new(),
        }
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    /// Builds membership keys for this group from user ids.
    pub fn members_from_user_ids(&self, user_ids: impl IntoIterator<Item = i64>) -> GroupMembers {
        user_ids
            .into_iter()
            .map(|user_id| GroupMember::new(self.id, user_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_are_a_set() {
        let mut members = GroupMembers::new();
        assert!(members.add(GroupMember::new(1, 2)));
        assert!(!members.add(GroupMember::new(1, 2)));
        assert_eq!(members.len(), 1);

        assert!(members.remove(&GroupMember::new(1, 2)));
        assert!(!members.remove(&GroupMember::new(1, 2)));
        assert!(members.is_empty());
    }

    #[test]
    fn test_member_identity_is_the_composite_key() {
        assert_eq!(GroupMember::new(1, 2), GroupMember::new(1, 2));
        assert_ne!(GroupMember::new(1, 2), GroupMember::new(2, 1));
    }

    #[test]
    fn test_retain_absent_from() {
        let mut members: GroupMembers =
            [GroupMember::new(1, 2), GroupMember::new(1, 3)].into_iter().collect();
        let removed: GroupMembers = [GroupMember::new(1, 3)].into_iter().collect();

        members.retain_absent_from(&removed);

        assert_eq!(members.user_ids(), vec![2]);
    }

    #[test]
    fn test_group_ownership() {
        let mut group = Group::new("Friends".into(), 7);
        group.id = 1;
        assert!(group.is_owned_by(7));
        assert!(!group.is_owned_by(8));

        let members = group.members_from_user_ids([2, 3, 2]);
        assert_eq!(members.len(), 2);
        assert!(members.contains(&GroupMember::new(1, 3)));
    }
}
