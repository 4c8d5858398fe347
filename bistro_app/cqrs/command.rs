use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::fmt;
use uuid::Uuid;

use bistro_core::{AppError, ApplicationError};

/// A trait for Command structs.
/// Commands are operations that change the state of the system. Each command type
/// has exactly one handler, whose output is handed back to the caller.
pub trait Command: fmt::Debug + Send + Sync + 'static {
    /// Unique name of the command, used for tracing and error reporting.
    const NAME: &'static str;

    /// What the handler returns to the caller.
    type Output: Send + 'static;
}

/// A trait for handlers that execute Commands.
/// Handlers receive their Unit of Work and collaborators at construction time
/// and should NOT manage the scope of the Unit of Work; that is the job of the AppBus.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C) -> Result<C::Output, ApplicationError>;
}

/// A command whose concrete type has been erased to travel through the bus queue.
pub struct BoxedCommand {
    id: Uuid,
    name: &'static str,
    type_id: TypeId,
    command: Box<dyn Any + Send + Sync>,
}

impl BoxedCommand {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is<C: Command>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    /// Tries to get back the concrete command.
    pub fn downcast<C: Command>(self) -> Result<C, ApplicationError> {
        let found = self.name;
        self.command
            .downcast::<C>()
            .map(|command| *command)
            .map_err(|_| {
                AppError::MessageTypeMismatch {
                    expected: C::NAME,
                    found,
                }
                .into()
            })
    }
}

impl<C: Command> From<C> for BoxedCommand {
    fn from(command: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: C::NAME,
            type_id: TypeId::of::<C>(),
            command: Box::new(command),
        }
    }
}

impl fmt::Debug for BoxedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedCommand")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u8);

    impl Command for Ping {
        const NAME: &'static str = "Ping";
        type Output = u8;
    }

    #[derive(Debug)]
    struct Pong;

    impl Command for Pong {
        const NAME: &'static str = "Pong";
        type Output = ();
    }

    #[test]
    fn test_boxed_command_keeps_identity() {
        let boxed = BoxedCommand::from(Ping(3));
        assert_eq!(boxed.name(), "Ping");
        assert!(boxed.is::<Ping>());
        assert!(!boxed.is::<Pong>());
        assert_eq!(boxed.downcast::<Ping>().unwrap(), Ping(3));
    }

    #[test]
    fn test_downcast_to_wrong_type_fails() {
        let boxed = BoxedCommand::from(Ping(3));
        match boxed.downcast::<Pong>() {
            Err(ApplicationError::App(AppError::MessageTypeMismatch { expected, found })) => {
                assert_eq!(expected, "Pong");
                assert_eq!(found, "Ping");
            }
            other => panic!("Expected MessageTypeMismatch, got: {:?}", other),
        }
    }
}
