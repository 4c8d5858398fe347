use bistro_types::Group;

use crate::cqrs::Query;

/// Groups owned by a user.
#[derive(Debug, Clone)]
pub struct GetUserGroups {
    pub user_id: i64,
}

impl Query for GetUserGroups {
    type Output = Vec<Group>;
}
