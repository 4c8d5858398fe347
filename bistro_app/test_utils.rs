#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use async_trait::async_trait;
    use std::{
        collections::{BTreeMap, BTreeSet},
        sync::{
            Arc, Mutex, OnceLock,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use bistro_core::{ApplicationError, DbError};
    use bistro_types::{Group, GroupMember, GroupMembers, User};

    use crate::{
        app::AppBus,
        app_registry::app_registry,
        auth::hash_password,
        bootstrap::{Bootstrap, Dependencies},
        config::Config,
        email::{EmailMessage, EmailSender},
        repository::{GroupRepository, UserRepository},
        uow::{EventBuffer, UnitOfWork, UnitOfWorkProvider},
    };

    /// Plain password of every user built by `user_factory`.
    pub const TEST_PASSWORD: &str = "secret123";

    #[derive(Debug, Clone)]
    struct GroupRow {
        id: i64,
        name: String,
        owner_id: i64,
    }

    #[derive(Debug, Clone, Default)]
    struct StoreState {
        users: BTreeMap<i64, User>,
        groups: BTreeMap<i64, GroupRow>,
        members: BTreeSet<GroupMember>,
        last_user_id: i64,
        last_group_id: i64,
    }

    impl StoreState {
        fn check_unique_user(&self, user: &User, except_id: Option<i64>) -> Result<(), DbError> {
            for other in self.users.values().filter(|u| Some(u.id) != except_id) {
                if other.email == user.email {
                    return Err(DbError::UniqueViolation("users_email_key".to_string()));
                }
                if other.username == user.username {
                    return Err(DbError::UniqueViolation("users_username_key".to_string()));
                }
            }
            Ok(())
        }

        fn check_unique_group(&self, group: &Group, except_id: Option<i64>) -> Result<(), DbError> {
            let taken = self.groups.values().any(|g| {
                Some(g.id) != except_id && g.owner_id == group.owner_id && g.name == group.name
            });
            if taken {
                return Err(DbError::UniqueViolation(
                    "groups_owner_id_name_key".to_string(),
                ));
            }
            Ok(())
        }

        fn load_group(&self, row: &GroupRow) -> Group {
            Group {
                id: row.id,
                name: row.name.clone(),
                owner_id: row.owner_id,
                members: self
                    .members
                    .iter()
                    .filter(|m| m.group_id == row.id)
                    .copied()
                    .collect(),
            }
        }
    }

    /// In-memory stand-in for the database, shared by every Unit of Work built on it.
    #[derive(Debug, Clone, Default)]
    pub struct MockStore {
        state: Arc<Mutex<StoreState>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn snapshot(&self) -> StoreState {
            self.state.lock().unwrap().clone()
        }

        fn publish(&self, state: StoreState) {
            *self.state.lock().unwrap() = state;
        }

        /// Inserts a user directly, bypassing any Unit of Work.
        pub fn seed_user(&self, mut user: User) -> User {
            let mut state = self.state.lock().unwrap();
            state.last_user_id += 1;
            user.id = state.last_user_id;
            state.users.insert(user.id, user.clone());
            user
        }

        /// Inserts a group and its members directly, bypassing any Unit of Work.
        pub fn seed_group(&self, mut group: Group) -> Group {
            let mut state = self.state.lock().unwrap();
            state.last_group_id += 1;
            group.id = state.last_group_id;
            state.groups.insert(
                group.id,
                GroupRow {
                    id: group.id,
                    name: group.name.clone(),
                    owner_id: group.owner_id,
                },
            );
            let members = group.members_from_user_ids(group.members.user_ids());
            state.members.extend(members.iter().copied());
            group.members = members;
            group
        }

        pub fn user(&self, id: i64) -> Option<User> {
            self.state.lock().unwrap().users.get(&id).cloned()
        }

        pub fn users(&self) -> Vec<User> {
            self.state.lock().unwrap().users.values().cloned().collect()
        }

        pub fn group(&self, id: i64) -> Option<Group> {
            let state = self.state.lock().unwrap();
            state.groups.get(&id).map(|row| state.load_group(row))
        }

        pub fn groups(&self) -> Vec<Group> {
            let state = self.state.lock().unwrap();
            state.groups.values().map(|row| state.load_group(row)).collect()
        }
    }

    /// Working copy of the store for one transaction. Taken on first use,
    /// published on commit, dropped on rollback.
    #[derive(Debug)]
    struct Staging {
        store: MockStore,
        staged: Mutex<Option<StoreState>>,
    }

    impl Staging {
        fn with_state<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
            let mut staged = self.staged.lock().unwrap();
            let state = staged.get_or_insert_with(|| self.store.snapshot());
            f(state)
        }

        fn commit(&self) {
            if let Some(state) = self.staged.lock().unwrap().take() {
                self.store.publish(state);
            }
        }

        fn rollback(&self) {
            self.staged.lock().unwrap().take();
        }
    }

    pub struct MockUserRepository {
        staging: Arc<Staging>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn add(&self, user: &User) -> Result<User, ApplicationError> {
            self.staging.with_state(|state| -> Result<User, ApplicationError> {
                state.check_unique_user(user, None)?;
                state.last_user_id += 1;
                let mut user = user.clone();
                user.id = state.last_user_id;
                state.users.insert(user.id, user.clone());
                Ok(user)
            })
        }

        async fn get(&self, id: i64) -> Result<Option<User>, ApplicationError> {
            Ok(self.staging.with_state(|state| state.users.get(&id).cloned()))
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApplicationError> {
            Ok(self.staging.with_state(|state| {
                state.users.values().find(|u| u.email == email).cloned()
            }))
        }

        async fn get_by_username(&self, username: &str) -> Result<Option<User>, ApplicationError> {
            Ok(self.staging.with_state(|state| {
                state.users.values().find(|u| u.username == username).cloned()
            }))
        }

        async fn update(&self, id: i64, user: &User) -> Result<User, ApplicationError> {
            self.staging.with_state(|state| -> Result<User, ApplicationError> {
                if !state.users.contains_key(&id) {
                    return Err(DbError::UserByIdNotFound(id).into());
                }
                state.check_unique_user(user, Some(id))?;
                let mut user = user.clone();
                user.id = id;
                state.users.insert(id, user.clone());
                Ok(user)
            })
        }

        async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
            self.staging.with_state(|state| {
                state.users.remove(&id);
                state.members.retain(|m| m.user_id != id);
            });
            Ok(())
        }

        async fn list(&self) -> Result<Vec<User>, ApplicationError> {
            Ok(self
                .staging
                .with_state(|state| state.users.values().cloned().collect()))
        }
    }

    pub struct MockGroupRepository {
        staging: Arc<Staging>,
    }

    #[async_trait]
    impl GroupRepository for MockGroupRepository {
        async fn add(&self, group: &Group) -> Result<Group, ApplicationError> {
            self.staging.with_state(|state| -> Result<Group, ApplicationError> {
                state.check_unique_group(group, None)?;
                state.last_group_id += 1;
                let row = GroupRow {
                    id: state.last_group_id,
                    name: group.name.clone(),
                    owner_id: group.owner_id,
                };
                state.groups.insert(row.id, row.clone());
                Ok(state.load_group(&row))
            })
        }

        async fn get(&self, id: i64) -> Result<Option<Group>, ApplicationError> {
            Ok(self.staging.with_state(|state| {
                state.groups.get(&id).map(|row| state.load_group(row))
            }))
        }

        async fn get_by_owner_and_name(
            &self,
            owner_id: i64,
            name: &str,
        ) -> Result<Option<Group>, ApplicationError> {
            Ok(self.staging.with_state(|state| {
                state
                    .groups
                    .values()
                    .find(|g| g.owner_id == owner_id && g.name == name)
                    .map(|row| state.load_group(row))
            }))
        }

        async fn get_owner_groups(&self, owner_id: i64) -> Result<Vec<Group>, ApplicationError> {
            Ok(self.staging.with_state(|state| {
                state
                    .groups
                    .values()
                    .filter(|g| g.owner_id == owner_id)
                    .map(|row| state.load_group(row))
                    .collect()
            }))
        }

        async fn update(&self, id: i64, group: &Group) -> Result<Group, ApplicationError> {
            self.staging.with_state(|state| -> Result<Group, ApplicationError> {
                if !state.groups.contains_key(&id) {
                    return Err(DbError::GroupByIdNotFound(id).into());
                }
                state.check_unique_group(group, Some(id))?;
                let row = GroupRow {
                    id,
                    name: group.name.clone(),
                    owner_id: group.owner_id,
                };
                state.groups.insert(id, row.clone());
                Ok(state.load_group(&row))
            })
        }

        async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
            self.staging.with_state(|state| {
                state.groups.remove(&id);
                state.members.retain(|m| m.group_id != id);
            });
            Ok(())
        }

        async fn add_members(&self, members: &GroupMembers) -> Result<(), ApplicationError> {
            self.staging.with_state(|state| -> Result<(), ApplicationError> {
                for member in members {
                    if !state.groups.contains_key(&member.group_id) {
                        return Err(DbError::GroupByIdNotFound(member.group_id).into());
                    }
                    if !state.users.contains_key(&member.user_id) {
                        return Err(DbError::UserByIdNotFound(member.user_id).into());
                    }
                }
                state.members.extend(members.iter().copied());
                Ok(())
            })
        }

        async fn remove_members(&self, members: &GroupMembers) -> Result<(), ApplicationError> {
            self.staging.with_state(|state| {
                for member in members {
                    state.members.remove(member);
                }
            });
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Group>, ApplicationError> {
            Ok(self.staging.with_state(|state| {
                state.groups.values().map(|row| state.load_group(row)).collect()
            }))
        }
    }

    pub struct MockUnitOfWork {
        staging: Arc<Staging>,
        events: EventBuffer,
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
    }

    impl MockUnitOfWork {
        /// A Unit of Work over a fresh, empty store.
        pub fn new() -> Self {
            Self::with_store(MockStore::new())
        }

        pub fn with_store(store: MockStore) -> Self {
            Self {
                staging: Arc::new(Staging {
                    store,
                    staged: Mutex::new(None),
                }),
                events: EventBuffer::new(),
                commits: AtomicUsize::new(0),
                rollbacks: AtomicUsize::new(0),
            }
        }

        pub fn store(&self) -> &MockStore {
            &self.staging.store
        }

        pub fn commits(&self) -> usize {
            self.commits.load(Ordering::SeqCst)
        }

        pub fn rollbacks(&self) -> usize {
            self.rollbacks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UnitOfWork for MockUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            Arc::new(MockUserRepository {
                staging: self.staging.clone(),
            })
        }

        fn groups(&self) -> Arc<dyn GroupRepository> {
            Arc::new(MockGroupRepository {
                staging: self.staging.clone(),
            })
        }

        fn events(&self) -> &EventBuffer {
            &self.events
        }

        async fn commit(&self) -> Result<(), ApplicationError> {
            self.staging.commit();
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&self) -> Result<(), ApplicationError> {
            self.staging.rollback();
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// A Unit of Work whose rollback always fails, as after a lost connection.
    pub struct FailingRollbackUnitOfWork {
        inner: MockUnitOfWork,
    }

    impl FailingRollbackUnitOfWork {
        pub fn new(store: MockStore) -> Self {
            Self {
                inner: MockUnitOfWork::with_store(store),
            }
        }
    }

    #[async_trait]
    impl UnitOfWork for FailingRollbackUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.inner.users()
        }

        fn groups(&self) -> Arc<dyn GroupRepository> {
            self.inner.groups()
        }

        fn events(&self) -> &EventBuffer {
            self.inner.events()
        }

        async fn commit(&self) -> Result<(), ApplicationError> {
            self.inner.commit().await
        }

        async fn rollback(&self) -> Result<(), ApplicationError> {
            Err(ApplicationError::Infrastructure("connection lost".to_string()))
        }
    }

    /// Hands out the same Unit of Work on every `begin`, so tests can inspect it afterwards.
    pub struct FixedUnitOfWorkProvider(pub Arc<dyn UnitOfWork>);

    #[async_trait]
    impl UnitOfWorkProvider for FixedUnitOfWorkProvider {
        async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, ApplicationError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct MockUnitOfWorkProvider {
        store: MockStore,
    }

    impl MockUnitOfWorkProvider {
        pub fn new(store: MockStore) -> Self {
            Self { store }
        }

        pub fn store(&self) -> &MockStore {
            &self.store
        }
    }

    #[async_trait]
    impl UnitOfWorkProvider for MockUnitOfWorkProvider {
        async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, ApplicationError> {
            Ok(Arc::new(MockUnitOfWork::with_store(self.store.clone())))
        }
    }

    /// Keeps every message instead of delivering it.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingEmailSender {
        sent: Arc<Mutex<Vec<EmailMessage>>>,
    }

    impl RecordingEmailSender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingEmailSender {
        async fn send(&self, message: EmailMessage) -> Result<(), ApplicationError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    /// Argon2 hash of `TEST_PASSWORD`, computed once per test binary.
    pub fn test_password_hash() -> String {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| hash_password(TEST_PASSWORD).unwrap())
            .clone()
    }

    /// A not yet stored user named `username`, with email `{username}@bistro.test`
    /// and password `TEST_PASSWORD`.
    pub fn user_factory(username: &str, email_verified: bool) -> User {
        let mut user = User::new(
            format!("{}@bistro.test", username),
            username.to_string(),
            test_password_hash(),
        );
        user.email_verified = email_verified;
        user
    }

    pub fn group_factory(name: &str, owner: &User) -> Group {
        Group::new(name.to_string(), owner.id)
    }

    pub fn test_config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    /// Dependencies of the application handlers, with the given email sender.
    pub fn test_dependencies(email_sender: Arc<RecordingEmailSender>) -> Dependencies {
        Dependencies::new()
            .with(test_config())
            .with::<dyn EmailSender>(email_sender)
    }

    /// AppBus wired with every application handler over an in-memory store.
    pub fn setup_app() -> Result<(AppBus, MockStore, Arc<RecordingEmailSender>), ApplicationError>
    {
        let store = MockStore::new();
        let email_sender = Arc::new(RecordingEmailSender::new());
        let bootstrap = Bootstrap::new(
            Arc::new(app_registry()?),
            test_dependencies(email_sender.clone()),
        );
        let app = AppBus::new(
            Arc::new(MockUnitOfWorkProvider::new(store.clone())),
            Arc::new(bootstrap),
        );
        Ok((app, store, email_sender))
    }
}
