use std::any::TypeId;

use crate::cqrs::{BoxedCommand, BoxedEvent, Command, Event};

/// Anything the message bus can process.
#[derive(Debug)]
pub enum Message {
    Command(BoxedCommand),
    Event(BoxedEvent),
}

impl Message {
    pub fn command<C: Command>(command: C) -> Self {
        Message::Command(command.into())
    }

    pub fn event<E: Event>(event: E) -> Self {
        Message::Event(event.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.name(),
            Message::Event(event) => event.name(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Message::Command(command) => command.type_id(),
            Message::Event(event) => event.type_id(),
        }
    }
}

impl From<BoxedCommand> for Message {
    fn from(command: BoxedCommand) -> Self {
        Message::Command(command)
    }
}

impl From<BoxedEvent> for Message {
    fn from(event: BoxedEvent) -> Self {
        Message::Event(event)
    }
}
