use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use bistro_core::{AppError, ApplicationError};

use crate::bootstrap::{Dependencies, Inject};
use crate::cqrs::{BoxedCommand, BoxedEvent, Command, CommandHandler, Event, EventHandler};

/// Type-erased command handler, as stored by the message bus.
#[async_trait]
pub(crate) trait DynCommandHandler: Send + Sync {
    async fn handle(&self, command: BoxedCommand) -> Result<Box<dyn Any + Send>, ApplicationError>;
}

/// Type-erased event handler, as stored by the message bus.
#[async_trait]
pub(crate) trait DynEventHandler: Send + Sync {
    async fn handle(&self, event: &BoxedEvent) -> Result<(), ApplicationError>;
}

struct InjectedCommandHandler<C, H> {
    handler: H,
    _command: PhantomData<fn() -> C>,
}

#[async_trait]
impl<C, H> DynCommandHandler for InjectedCommandHandler<C, H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, command: BoxedCommand) -> Result<Box<dyn Any + Send>, ApplicationError> {
        let command = command.downcast::<C>()?;
        let output = self.handler.handle(command).await?;
        Ok(Box::new(output))
    }
}

struct InjectedEventHandler<E, H> {
    handler: H,
    _event: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, H> DynEventHandler for InjectedEventHandler<E, H>
where
    E: Event,
    H: EventHandler<E>,
{
    async fn handle(&self, event: &BoxedEvent) -> Result<(), ApplicationError> {
        let event = event.downcast_ref::<E>()?;
        self.handler.handle(event).await
    }
}

type CommandFactory =
    fn(&Dependencies) -> Result<Box<dyn DynCommandHandler>, ApplicationError>;
type EventFactory = fn(&Dependencies) -> Result<Box<dyn DynEventHandler>, ApplicationError>;

fn command_factory<C, H>(
    dependencies: &Dependencies,
) -> Result<Box<dyn DynCommandHandler>, ApplicationError>
where
    C: Command,
    H: CommandHandler<C> + Inject + 'static,
{
    Ok(Box::new(InjectedCommandHandler::<C, H> {
        handler: H::inject(dependencies)?,
        _command: PhantomData,
    }))
}

fn event_factory<E, H>(
    dependencies: &Dependencies,
) -> Result<Box<dyn DynEventHandler>, ApplicationError>
where
    E: Event,
    H: EventHandler<E> + Inject + 'static,
{
    Ok(Box::new(InjectedEventHandler::<E, H> {
        handler: H::inject(dependencies)?,
        _event: PhantomData,
    }))
}

struct CommandRegistration {
    name: &'static str,
    factory: CommandFactory,
}

struct EventRegistration {
    name: &'static str,
    factories: Vec<EventFactory>,
}

pub(crate) struct CommandHandlerEntry {
    pub(crate) name: &'static str,
    pub(crate) handler: Box<dyn DynCommandHandler>,
}

pub(crate) struct EventHandlersEntry {
    pub(crate) name: &'static str,
    pub(crate) handlers: Vec<Box<dyn DynEventHandler>>,
}

pub(crate) type CommandHandlers = HashMap<TypeId, CommandHandlerEntry>;
pub(crate) type EventHandlers = HashMap<TypeId, EventHandlersEntry>;

/// Immutable map from message types to the handlers that process them:
/// one handler per command type, an ordered list of handlers per event type.
pub struct HandlerRegistry {
    commands: HashMap<TypeId, CommandRegistration>,
    events: HashMap<TypeId, EventRegistration>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    pub fn handles_command<C: Command>(&self) -> bool {
        self.commands.contains_key(&TypeId::of::<C>())
    }

    pub fn handles_event<E: Event>(&self) -> bool {
        self.events.contains_key(&TypeId::of::<E>())
    }

    /// Number of handlers subscribed to `E` (zero for declared-only or unknown events).
    pub fn event_handlers_count<E: Event>(&self) -> usize {
        self.events
            .get(&TypeId::of::<E>())
            .map_or(0, |registration| registration.factories.len())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.values().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.events.values().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn instantiate(
        &self,
        dependencies: &Dependencies,
    ) -> Result<(CommandHandlers, EventHandlers), ApplicationError> {
        let mut commands = HashMap::with_capacity(self.commands.len());
        for (type_id, registration) in &self.commands {
            let handler = (registration.factory)(dependencies)?;
            commands.insert(
                *type_id,
                CommandHandlerEntry {
                    name: registration.name,
                    handler,
                },
            );
        }

        let mut events = HashMap::with_capacity(self.events.len());
        for (type_id, registration) in &self.events {
            let handlers = registration
                .factories
                .iter()
                .map(|factory| factory(dependencies))
                .collect::<Result<Vec<_>, _>>()?;
            events.insert(
                *type_id,
                EventHandlersEntry {
                    name: registration.name,
                    handlers,
                },
            );
        }

        Ok((commands, events))
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    commands: Vec<(TypeId, CommandRegistration)>,
    events: Vec<(TypeId, EventRegistration)>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler of command `C`.
    pub fn command<C, H>(mut self) -> Self
    where
        C: Command,
        H: CommandHandler<C> + Inject + 'static,
    {
        self.commands.push((
            TypeId::of::<C>(),
            CommandRegistration {
                name: C::NAME,
                factory: command_factory::<C, H>,
            },
        ));
        self
    }

    /// Subscribes a handler to event `E`, after the ones already registered.
    pub fn event<E, H>(mut self) -> Self
    where
        E: Event,
        H: EventHandler<E> + Inject + 'static,
    {
        self.event_registration::<E>()
            .factories
            .push(event_factory::<E, H>);
        self
    }

    /// Makes `E` a known event type, even without subscribers.
    pub fn declare_event<E: Event>(mut self) -> Self {
        self.event_registration::<E>();
        self
    }

    /// Appends every registration of `other`.
    pub fn merge(mut self, other: HandlerRegistryBuilder) -> Self {
        self.commands.extend(other.commands);
        for (type_id, registration) in other.events {
            match self.events.iter_mut().find(|(id, _)| *id == type_id) {
                Some((_, existing)) => existing.factories.extend(registration.factories),
                None => self.events.push((type_id, registration)),
            }
        }
        self
    }

    pub fn build(self) -> Result<HandlerRegistry, ApplicationError> {
        let mut commands = HashMap::with_capacity(self.commands.len());
        for (type_id, registration) in self.commands {
            if commands.contains_key(&type_id) {
                return Err(AppError::DuplicateCommandHandler(registration.name).into());
            }
            commands.insert(type_id, registration);
        }

        Ok(HandlerRegistry {
            commands,
            events: self.events.into_iter().collect(),
        })
    }

    fn event_registration<E: Event>(&mut self) -> &mut EventRegistration {
        let type_id = TypeId::of::<E>();
        let index = match self.events.iter().position(|(id, _)| *id == type_id) {
            Some(index) => index,
            None => {
                self.events.push((
                    type_id,
                    EventRegistration {
                        name: E::NAME,
                        factories: Vec::new(),
                    },
                ));
                self.events.len() - 1
            }
        };
        &mut self.events[index].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;

    impl Command for Ping {
        const NAME: &'static str = "Ping";
        type Output = ();
    }

    #[derive(Debug)]
    struct Pinged;

    impl Event for Pinged {
        const NAME: &'static str = "Pinged";
    }

    struct PingHandler;

    impl Inject for PingHandler {
        fn inject(_: &Dependencies) -> Result<Self, ApplicationError> {
            Ok(Self)
        }
    }

    #[async_trait]
    impl CommandHandler<Ping> for PingHandler {
        async fn handle(&self, _: Ping) -> Result<(), ApplicationError> {
            Ok(())
        }
    }

    #[async_trait]
    impl EventHandler<Pinged> for PingHandler {
        async fn handle(&self, _: &Pinged) -> Result<(), ApplicationError> {
            Ok(())
        }
    }

    struct NeedsCounter;

    impl Inject for NeedsCounter {
        fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
            dependencies.require::<u64>()?;
            Ok(Self)
        }
    }

    #[async_trait]
    impl EventHandler<Pinged> for NeedsCounter {
        async fn handle(&self, _: &Pinged) -> Result<(), ApplicationError> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_command_handler_is_rejected() {
        let result = HandlerRegistry::builder()
            .command::<Ping, PingHandler>()
            .merge(HandlerRegistry::builder().command::<Ping, PingHandler>())
            .build();

        match result {
            Err(ApplicationError::App(AppError::DuplicateCommandHandler(name))) => {
                assert_eq!(name, "Ping")
            }
            Err(e) => panic!("Expected DuplicateCommandHandler, got: {:?}", e),
            Ok(_) => panic!("Expected DuplicateCommandHandler, got a registry"),
        }
    }

    #[test]
    fn test_event_handlers_accumulate_across_merges() {
        let registry = HandlerRegistry::builder()
            .event::<Pinged, PingHandler>()
            .merge(HandlerRegistry::builder().event::<Pinged, PingHandler>())
            .build()
            .unwrap();

        assert!(registry.handles_event::<Pinged>());
        assert!(!registry.handles_command::<Ping>());
        assert_eq!(registry.event_handlers_count::<Pinged>(), 2);
    }

    #[test]
    fn test_declared_event_has_no_handlers() {
        let registry = HandlerRegistry::builder()
            .declare_event::<Pinged>()
            .build()
            .unwrap();

        assert!(registry.handles_event::<Pinged>());
        assert_eq!(registry.event_handlers_count::<Pinged>(), 0);
        assert_eq!(registry.event_names(), vec!["Pinged"]);
    }

    #[test]
    fn test_instantiate_fails_on_missing_dependency() {
        let registry = HandlerRegistry::builder()
            .event::<Pinged, NeedsCounter>()
            .build()
            .unwrap();

        assert!(matches!(
            registry.instantiate(&Dependencies::new()),
            Err(ApplicationError::App(AppError::MissingDependency(_)))
        ));

        let dependencies = Dependencies::new().with(std::sync::Arc::new(7u64));
        let (_, events) = registry.instantiate(&dependencies).unwrap();
        assert_eq!(events[&TypeId::of::<Pinged>()].handlers.len(), 1);
    }
}
