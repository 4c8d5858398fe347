use std::any::{Any, type_name};
use std::collections::VecDeque;
use std::sync::Arc;

use bistro_core::{AppError, ApplicationError};

use crate::cqrs::{BoxedCommand, BoxedEvent, Message};
use crate::registry::{CommandHandlers, EventHandlers};
use crate::uow::UnitOfWork;

/// Drives one message to completion: the initial message is handled once, and every
/// event collected by the Unit of Work along the way is dispatched before `handle` returns.
///
/// Events are collected after each single handler call, so events raised by a handler are
/// queued before the next handler of the same event runs.
pub struct MessageBus {
    uow: Arc<dyn UnitOfWork>,
    command_handlers: CommandHandlers,
    event_handlers: EventHandlers,
    command_result: Option<Box<dyn Any + Send>>,
    dispatch_log: Vec<&'static str>,
}

impl MessageBus {
    pub(crate) fn new(
        uow: Arc<dyn UnitOfWork>,
        command_handlers: CommandHandlers,
        event_handlers: EventHandlers,
    ) -> Self {
        Self {
            uow,
            command_handlers,
            event_handlers,
            command_result: None,
            dispatch_log: Vec::new(),
        }
    }

    pub fn uow(&self) -> &Arc<dyn UnitOfWork> {
        &self.uow
    }

    pub async fn handle(&mut self, message: impl Into<Message>) -> Result<(), ApplicationError> {
        self.command_result = None;
        self.dispatch_log.clear();

        let mut queue = VecDeque::from([message.into()]);
        while let Some(message) = queue.pop_front() {
            match message {
                Message::Command(command) => self.handle_command(command, &mut queue).await?,
                Message::Event(event) => self.handle_event(event, &mut queue).await?,
            }
        }

        Ok(())
    }

    /// Result of the last command handled, if any.
    pub fn command_result(&self) -> Option<&(dyn Any + Send)> {
        self.command_result.as_deref()
    }

    pub fn take_command_result<T: 'static>(&mut self) -> Result<T, ApplicationError> {
        let result = self
            .command_result
            .take()
            .ok_or(AppError::MissingCommandResult)?;

        result
            .downcast::<T>()
            .map(|result| *result)
            .map_err(|_| AppError::CommandResultTypeMismatch(type_name::<T>()).into())
    }

    /// Names of the messages dispatched by the last `handle` call, in dispatch order.
    pub fn dispatch_log(&self) -> &[&'static str] {
        &self.dispatch_log
    }

    async fn handle_command(
        &mut self,
        command: BoxedCommand,
        queue: &mut VecDeque<Message>,
    ) -> Result<(), ApplicationError> {
        let entry = self
            .command_handlers
            .get(&command.type_id())
            .ok_or(AppError::UnsupportedMessageType(command.name()))?;

        tracing::debug!(command = entry.name, command_id = %command.id(), "Handling command");
        self.dispatch_log.push(entry.name);

        let output = entry.handler.handle(command).await?;
        self.command_result = Some(output);

        collect_events(self.uow.as_ref(), queue);
        Ok(())
    }

    async fn handle_event(
        &mut self,
        event: BoxedEvent,
        queue: &mut VecDeque<Message>,
    ) -> Result<(), ApplicationError> {
        let entry = self
            .event_handlers
            .get(&event.type_id())
            .ok_or(AppError::UnsupportedMessageType(event.name()))?;

        tracing::debug!(
            event = entry.name,
            event_id = %event.id(),
            handlers = entry.handlers.len(),
            "Handling event"
        );
        self.dispatch_log.push(entry.name);

        for handler in &entry.handlers {
            handler.handle(&event).await?;
            collect_events(self.uow.as_ref(), queue);
        }

        Ok(())
    }
}

fn collect_events(uow: &dyn UnitOfWork, queue: &mut VecDeque<Message>) {
    let events = uow.events().drain();
    if !events.is_empty() {
        tracing::trace!(count = events.len(), "Collected events");
        queue.extend(events.into_iter().map(Message::Event));
    }
}
