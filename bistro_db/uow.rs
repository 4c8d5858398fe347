use sqlx::{PgPool, Postgres, Transaction};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use bistro_app::{
    repository::*,
    uow::{EventBuffer, UnitOfWork, UnitOfWorkProvider},
};
use bistro_core::{ApplicationError, DbError};

use crate::repository::*;

/// The transaction shared by a Unit of Work and its repositories.
/// A new one is begun on first use after a commit or rollback.
pub struct PgSession {
    pool: PgPool,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PgSession {
    fn new(pool: PgPool, tx: Transaction<'static, Postgres>) -> Self {
        Self {
            pool,
            tx: Mutex::new(Some(tx)),
        }
    }

    /// Locks the current transaction, beginning one if needed.
    pub async fn transaction(&self) -> Result<TxGuard<'_>, ApplicationError> {
        let mut guard = self.tx.lock().await;
        if guard.is_none() {
            tracing::trace!("Beginning a new transaction");
            *guard = Some(self.pool.begin().await.map_err(DbError::from_sqlx)?);
        }

        TxGuard::new(guard).ok_or_else(|| {
            DbError::Transaction("transaction is not available".to_string()).into()
        })
    }

    async fn commit(&self) -> Result<(), ApplicationError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tracing::trace!("Committing transaction");
            tx.commit().await.map_err(DbError::from_sqlx)?;
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), ApplicationError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tx.rollback().await.map_err(DbError::from_sqlx)?;
        }
        Ok(())
    }
}

/// Locked access to the open transaction of a [`PgSession`].
///
/// Wraps the plain `MutexGuard` rather than a `MappedMutexGuard`, whose `Send`
/// impl carries a `T: 'a` bound that rustc cannot prove inside `async_trait`
/// futures.
pub struct TxGuard<'a>(MutexGuard<'a, Option<Transaction<'static, Postgres>>>);

impl<'a> TxGuard<'a> {
    fn new(guard: MutexGuard<'a, Option<Transaction<'static, Postgres>>>) -> Option<Self> {
        guard.is_some().then(|| Self(guard))
    }
}

impl Deref for TxGuard<'_> {
    type Target = Transaction<'static, Postgres>;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref().expect("TxGuard holds an open transaction")
    }
}

impl DerefMut for TxGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut().expect("TxGuard holds an open transaction")
    }
}

#[derive(Debug, Clone)]
pub struct PostgresUnitOfWorkProvider {
    pool: PgPool,
}

impl PostgresUnitOfWorkProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UnitOfWorkProvider for PostgresUnitOfWorkProvider {
    async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, ApplicationError> {
        let tx = self.pool.begin().await.map_err(DbError::from_sqlx)?;
        Ok(Arc::new(PostgresUnitOfWork {
            session: Arc::new(PgSession::new(self.pool.clone(), tx)),
            events: EventBuffer::new(),
        }))
    }
}

/// Dropping it without committing rolls the open transaction back.
pub struct PostgresUnitOfWork {
    session: Arc<PgSession>,
    events: EventBuffer,
}

#[async_trait::async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(PostgresUserRepository::new(self.session.clone()))
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        Arc::new(PostgresGroupRepository::new(self.session.clone()))
    }

    fn events(&self) -> &EventBuffer {
        &self.events
    }

    async fn commit(&self) -> Result<(), ApplicationError> {
        self.session.commit().await
    }

    async fn rollback(&self) -> Result<(), ApplicationError> {
        self.session.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{establish_test_connection_pool, run_migrations};
    use bistro_app::test_utils::tests::user_factory;

    async fn provider() -> PostgresUnitOfWorkProvider {
        let pool = establish_test_connection_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        PostgresUnitOfWorkProvider::new(pool)
    }

    #[tokio::test]
    #[ignore = "needs TEST_DATABASE_URL"]
    async fn test_uncommitted_work_is_discarded_on_close() {
        let provider = provider().await;

        let uow = provider.begin().await.unwrap();
        let user = uow
            .users()
            .add(&user_factory("uow_rollback", false))
            .await
            .unwrap();
        uow.close().await.unwrap();

        let uow = provider.begin().await.unwrap();
        assert!(uow.users().get(user.id).await.unwrap().is_none());
        uow.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs TEST_DATABASE_URL"]
    async fn test_unit_of_work_is_usable_after_commit() {
        let provider = provider().await;

        let uow = provider.begin().await.unwrap();
        let user = uow
            .users()
            .add(&user_factory("uow_after_commit", false))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        // Next statement runs in a fresh transaction.
        let found = uow.users().get(user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "uow_after_commit");
        uow.users().delete(user.id).await.unwrap();
        uow.commit().await.unwrap();
        uow.close().await.unwrap();
    }
}
