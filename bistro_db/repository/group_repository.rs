use std::sync::Arc;

use bistro_app::repository::GroupRepository;
use bistro_core::{ApplicationError, DbError};
use bistro_types::{Group, GroupMembers};

use crate::models::{GroupMemberRow, GroupRow};
use crate::uow::PgSession;

#[derive(Clone)]
pub struct PostgresGroupRepository {
    session: Arc<PgSession>,
}

impl PostgresGroupRepository {
    pub fn new(session: Arc<PgSession>) -> Self {
        Self { session }
    }

    /// Loads the members of `rows` and assembles the groups, keeping row order.
    async fn with_members(&self, rows: Vec<GroupRow>) -> Result<Vec<Group>, ApplicationError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let members = {
            let mut tx = self.session.transaction().await?;
            sqlx::query_as::<_, GroupMemberRow>(
                r#"
                SELECT group_id, user_id
                FROM group_members
                WHERE group_id = ANY($1)
                "#,
            )
            .bind(&ids)
            .fetch_all(&mut **tx)
            .await
            .map_err(DbError::from_sqlx)?
        };

        Ok(rows
            .into_iter()
            .map(|row| row.into_group(&members))
            .collect())
    }

    async fn with_members_one(&self, row: Option<GroupRow>) -> Result<Option<Group>, ApplicationError> {
        match row {
            Some(row) => Ok(self.with_members(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn member_columns(members: &GroupMembers) -> (Vec<i64>, Vec<i64>) {
    members.iter().map(|m| (m.group_id, m.user_id)).unzip()
}

#[async_trait::async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn add(&self, group: &Group) -> Result<Group, ApplicationError> {
        let mut tx = self.session.transaction().await?;
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            INSERT INTO groups (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id
            "#,
        )
        .bind(&group.name)
        .bind(group.owner_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(row.into_group(&[]))
    }

    async fn get(&self, id: i64) -> Result<Option<Group>, ApplicationError> {
        let row = {
            let mut tx = self.session.transaction().await?;
            sqlx::query_as::<_, GroupRow>("SELECT id, name, owner_id FROM groups WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(DbError::from_sqlx)?
        };

        self.with_members_one(row).await
    }

    async fn get_by_owner_and_name(
        &self,
        owner_id: i64,
        name: &str,
    ) -> Result<Option<Group>, ApplicationError> {
        let row = {
            let mut tx = self.session.transaction().await?;
            sqlx::query_as::<_, GroupRow>(
                r#"
                SELECT id, name, owner_id
                FROM groups
                WHERE owner_id = $1 AND name = $2
                "#,
            )
            .bind(owner_id)
            .bind(name)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from_sqlx)?
        };

        self.with_members_one(row).await
    }

    async fn get_owner_groups(&self, owner_id: i64) -> Result<Vec<Group>, ApplicationError> {
        let rows = {
            let mut tx = self.session.transaction().await?;
            sqlx::query_as::<_, GroupRow>(
                r#"
                SELECT id, name, owner_id
                FROM groups
                WHERE owner_id = $1
                ORDER BY id
                "#,
            )
            .bind(owner_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(DbError::from_sqlx)?
        };

        self.with_members(rows).await
    }

    async fn update(&self, id: i64, group: &Group) -> Result<Group, ApplicationError> {
        let row = {
            let mut tx = self.session.transaction().await?;
            sqlx::query_as::<_, GroupRow>(
                r#"
                UPDATE groups
                SET name = $2, owner_id = $3
                WHERE id = $1
                RETURNING id, name, owner_id
                "#,
            )
            .bind(id)
            .bind(&group.name)
            .bind(group.owner_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from_sqlx)?
            .ok_or(DbError::GroupByIdNotFound(id))?
        };

        self.with_members_one(Some(row))
            .await?
            .ok_or_else(|| DbError::GroupByIdNotFound(id).into())
    }

    async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
        let mut tx = self.session.transaction().await?;
        // Memberships go with the group (ON DELETE CASCADE).
        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(DbError::from_sqlx)?;

        Ok(())
    }

    async fn add_members(&self, members: &GroupMembers) -> Result<(), ApplicationError> {
        if members.is_empty() {
            return Ok(());
        }

        let (group_ids, user_ids) = member_columns(members);
        let mut tx = self.session.transaction().await?;
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&group_ids)
        .bind(&user_ids)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(())
    }

    async fn remove_members(&self, members: &GroupMembers) -> Result<(), ApplicationError> {
        if members.is_empty() {
            return Ok(());
        }

        let (group_ids, user_ids) = member_columns(members);
        let mut tx = self.session.transaction().await?;
        sqlx::query(
            r#"
            DELETE FROM group_members
            WHERE (group_id, user_id) IN (
                SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[])
            )
            "#,
        )
        .bind(&group_ids)
        .bind(&user_ids)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Group>, ApplicationError> {
        let rows = {
            let mut tx = self.session.transaction().await?;
            sqlx::query_as::<_, GroupRow>("SELECT id, name, owner_id FROM groups ORDER BY id")
                .fetch_all(&mut **tx)
                .await
                .map_err(DbError::from_sqlx)?
        };

        self.with_members(rows).await
    }
}
