use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bistro_core::{AppError, ApplicationError};

use crate::messagebus::MessageBus;
use crate::registry::HandlerRegistry;
use crate::uow::UnitOfWork;

/// Typed dependency container, keyed by the type of the shared value.
///
/// Values are stored as `Arc<T>`, so trait objects can be registered and resolved
/// as such (e.g. `Arc<dyn EmailSender>`).
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value, replacing any previous value of the same type.
    pub fn insert<T>(&mut self, value: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .insert(TypeId::of::<T>(), (type_name::<T>(), Arc::new(value)));
    }

    pub fn with<T>(mut self, value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert(value);
        self
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|(_, value)| value.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Like `get`, but a missing value is an error.
    pub fn require<T>(&self) -> Result<Arc<T>, ApplicationError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>()
            .ok_or_else(|| AppError::MissingDependency(type_name::<T>()).into())
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.values().map(|(name, _)| name))
            .finish()
    }
}

/// Builds a handler from the dependencies available to a message bus.
/// Handlers resolve only what they use; the live Unit of Work is always available.
pub trait Inject: Sized {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError>;
}

/// Composition root of the message bus: the handler registry plus the
/// process-wide dependencies shared by every request.
pub struct Bootstrap {
    registry: Arc<HandlerRegistry>,
    dependencies: Dependencies,
}

impl Bootstrap {
    pub fn new(registry: Arc<HandlerRegistry>, dependencies: Dependencies) -> Self {
        Self {
            registry,
            dependencies,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Builds a message bus bound to `uow`, instantiating every registered handler.
    pub fn messagebus(&self, uow: Arc<dyn UnitOfWork>) -> Result<MessageBus, ApplicationError> {
        let mut dependencies = self.dependencies.clone();
        dependencies.insert::<dyn UnitOfWork>(uow.clone());

        let (command_handlers, event_handlers) = self.registry.instantiate(&dependencies)?;
        Ok(MessageBus::new(uow, command_handlers, event_handlers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_trait_objects_resolve_by_their_trait() {
        let dependencies = Dependencies::new().with::<dyn Greeter>(Arc::new(English));

        let greeter = dependencies.require::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(dependencies.contains::<dyn Greeter>());
        assert!(!dependencies.contains::<English>());
    }

    #[test]
    fn test_require_reports_missing_type() {
        let dependencies = Dependencies::new();

        assert!(dependencies.get::<u32>().is_none());
        match dependencies.require::<dyn Greeter>() {
            Err(ApplicationError::App(AppError::MissingDependency(name))) => {
                assert!(name.contains("Greeter"));
            }
            Err(e) => panic!("Expected MissingDependency, got: {:?}", e),
            Ok(_) => panic!("Expected MissingDependency, got a value"),
        }
    }

    #[test]
    fn test_insert_replaces_previous_value() {
        let mut dependencies = Dependencies::new();
        dependencies.insert(Arc::new(1u32));
        dependencies.insert(Arc::new(2u32));

        assert_eq!(*dependencies.require::<u32>().unwrap(), 2);
    }
}
