use std::sync::Arc;

use bistro_core::ApplicationError;

use crate::{
    bootstrap::Bootstrap,
    cqrs::{Command, Message, Query, QueryHandler},
    uow::{UnitOfWork, UnitOfWorkProvider},
};

/// AppBus (Mediator)
/// This struct is the central entry point for all application logic.
/// It does not contain any business logic itself.
/// Its primary roles are:
/// 1. Managing Unit of Work (transaction) lifecycles.
/// 2. Dispatching Commands to the message bus and Queries to their handlers.
pub struct AppBus {
    uow_provider: Arc<dyn UnitOfWorkProvider>,
    bootstrap: Arc<Bootstrap>,
}

impl AppBus {
    pub fn new(uow_provider: Arc<dyn UnitOfWorkProvider>, bootstrap: Arc<Bootstrap>) -> Self {
        Self {
            uow_provider,
            bootstrap,
        }
    }

    /// Executes a command.
    /// A command is an operation that modifies the system state.
    /// This method manages the Unit of Work:
    /// - It begins a Unit of Work and builds a message bus bound to it.
    /// - The bus runs the command and every event it raises.
    /// - The Unit of Work is always closed afterwards, so whatever the handlers
    ///   did not commit is rolled back.
    pub async fn execute<C: Command>(&self, command: C) -> Result<C::Output, ApplicationError> {
        let uow = self.uow_provider.begin().await?;

        let result = self.dispatch(&uow, command).await;
        let closed = uow.close().await;

        Self::settle(result, closed)
    }

    async fn dispatch<C: Command>(
        &self,
        uow: &Arc<dyn UnitOfWork>,
        command: C,
    ) -> Result<C::Output, ApplicationError> {
        let mut bus = self.bootstrap.messagebus(uow.clone())?;
        bus.handle(Message::command(command)).await?;
        bus.take_command_result::<C::Output>()
    }

    /// Executes a query.
    /// A query is an operation that reads system state and returns data.
    /// It should *never* modify the state.
    /// This method ensures the transaction is *always* rolled back.
    pub async fn query<Q, H>(&self, query: Q, handler: H) -> Result<Q::Output, ApplicationError>
    where
        Q: Query,
        H: QueryHandler<Q>,
    {
        let uow = self.uow_provider.begin().await?;

        let result = handler.handle(query, &uow).await;

        // Always rollback a query, as it should never write data.
        let closed = uow.close().await;

        Self::settle(result, closed)
    }

    /// The handler error wins over a failure to close the Unit of Work.
    fn settle<T>(
        result: Result<T, ApplicationError>,
        closed: Result<(), ApplicationError>,
    ) -> Result<T, ApplicationError> {
        match (result, closed) {
            (Ok(output), Ok(())) => Ok(output),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "Failed to close unit of work");
                }
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use bistro_core::DomainError;

    use crate::bootstrap::{Dependencies, Inject};
    use crate::cqrs::commands::{CreateGroup, RegisterUser};
    use crate::cqrs::{CommandHandler, Event, EventHandler};
    use crate::registry::HandlerRegistry;
    use crate::test_utils::tests::{
        FailingRollbackUnitOfWork, FixedUnitOfWorkProvider, MockStore, MockUnitOfWork, setup_app,
        user_factory,
    };
    use crate::uow::UnitOfWorkExt;

    /// Stores a user, never commits, then fails.
    #[derive(Debug)]
    struct StashAndFail;

    impl Command for StashAndFail {
        const NAME: &'static str = "StashAndFail";
        type Output = ();
    }

    /// Stores and commits a user, then raises `Stored`.
    #[derive(Debug)]
    struct StoreAndCommit;

    impl Command for StoreAndCommit {
        const NAME: &'static str = "StoreAndCommit";
        type Output = ();
    }

    #[derive(Debug)]
    struct Stored;

    impl Event for Stored {
        const NAME: &'static str = "Stored";
    }

    struct Storekeeper {
        uow: Arc<dyn UnitOfWork>,
    }

    impl Inject for Storekeeper {
        fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
            Ok(Self {
                uow: dependencies.require::<dyn UnitOfWork>()?,
            })
        }
    }

    #[async_trait]
    impl CommandHandler<StashAndFail> for Storekeeper {
        async fn handle(&self, _: StashAndFail) -> Result<(), ApplicationError> {
            self.uow.users().add(&user_factory("ghost", false)).await?;
            Err(ApplicationError::Infrastructure("boom".to_string()))
        }
    }

    #[async_trait]
    impl CommandHandler<StoreAndCommit> for Storekeeper {
        async fn handle(&self, _: StoreAndCommit) -> Result<(), ApplicationError> {
            self.uow.users().add(&user_factory("keeper", false)).await?;
            self.uow.commit().await?;
            self.uow.add_event(Stored)
        }
    }

    #[async_trait]
    impl EventHandler<Stored> for Storekeeper {
        async fn handle(&self, _: &Stored) -> Result<(), ApplicationError> {
            Err(ApplicationError::Infrastructure("mailer down".to_string()))
        }
    }

    fn storekeeper_app(uow: Arc<dyn UnitOfWork>) -> AppBus {
        let registry = HandlerRegistry::builder()
            .command::<StashAndFail, Storekeeper>()
            .command::<StoreAndCommit, Storekeeper>()
            .event::<Stored, Storekeeper>()
            .build()
            .unwrap();
        AppBus::new(
            Arc::new(FixedUnitOfWorkProvider(uow)),
            Arc::new(Bootstrap::new(Arc::new(registry), Dependencies::new())),
        )
    }

    struct CountUsers;

    impl Query for CountUsers {
        type Output = usize;
    }

    struct CountUsersHandler;

    #[async_trait]
    impl QueryHandler<CountUsers> for CountUsersHandler {
        async fn handle(
            &self,
            _: CountUsers,
            uow: &Arc<dyn UnitOfWork>,
        ) -> Result<usize, ApplicationError> {
            Ok(uow.users().list().await?.len())
        }
    }

    struct MissingUserHandler;

    #[async_trait]
    impl QueryHandler<CountUsers> for MissingUserHandler {
        async fn handle(
            &self,
            _: CountUsers,
            _: &Arc<dyn UnitOfWork>,
        ) -> Result<usize, ApplicationError> {
            Err(DomainError::UserNotFound.into())
        }
    }

    #[tokio::test]
    async fn test_execute_returns_typed_output() {
        let (app, store, _) = setup_app().unwrap();

        let user = app
            .execute(RegisterUser::new(
                "alice@bistro.test".to_string(),
                "alice".to_string(),
                "secret123".to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_command_leaves_store_untouched() {
        let (app, store, _) = setup_app().unwrap();
        let owner = store.seed_user(user_factory("owner", true));

        let result = app
            .execute(CreateGroup {
                name: String::new(),
                user: owner,
            })
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::GroupNameValidation { .. }))
        ));
        assert!(store.groups().is_empty());
    }

    #[tokio::test]
    async fn test_uncommitted_write_is_rolled_back_on_failure() {
        let store = MockStore::new();
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let app = storekeeper_app(uow.clone());

        let result = app.execute(StashAndFail).await;

        assert!(matches!(result, Err(ApplicationError::Infrastructure(_))));
        assert!(store.users().is_empty());
        assert_eq!(uow.commits(), 0);
        assert_eq!(uow.rollbacks(), 1);
        assert!(uow.events().is_closed());
    }

    #[tokio::test]
    async fn test_committed_write_survives_a_failing_event_handler() {
        let store = MockStore::new();
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let app = storekeeper_app(uow.clone());

        let result = app.execute(StoreAndCommit).await;

        match result {
            Err(ApplicationError::Infrastructure(msg)) => assert_eq!(msg, "mailer down"),
            other => panic!("Expected the event handler error, got: {:?}", other),
        }
        let users = store.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "keeper");
        assert_eq!(uow.commits(), 1);
        assert_eq!(uow.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_query_reads_and_rolls_back() {
        let store = MockStore::new();
        store.seed_user(user_factory("reader", true));
        let uow = Arc::new(MockUnitOfWork::with_store(store.clone()));
        let app = storekeeper_app(uow.clone());

        let count = app.query(CountUsers, CountUsersHandler).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(uow.commits(), 0);
        assert_eq!(uow.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_query_error_wins_over_close_error() {
        let app = storekeeper_app(Arc::new(FailingRollbackUnitOfWork::new(MockStore::new())));

        let result = app.query(CountUsers, MissingUserHandler).await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::UserNotFound))
        ));
    }

    #[tokio::test]
    async fn test_close_error_surfaces_when_query_succeeds() {
        let app = storekeeper_app(Arc::new(FailingRollbackUnitOfWork::new(MockStore::new())));

        let result = app.query(CountUsers, CountUsersHandler).await;

        assert!(matches!(result, Err(ApplicationError::Infrastructure(_))));
    }
}
