use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bistro_core::{AppError, ApplicationError};

use crate::cqrs::{BoxedEvent, Event};
use crate::repository::*;

/// Ordered buffer of the events produced inside one Unit of Work.
/// Events can only be appended while the scope is open, and reading them drains them.
#[derive(Debug, Default)]
pub struct EventBuffer {
    state: Mutex<EventBufferState>,
}

#[derive(Debug, Default)]
struct EventBufferState {
    events: VecDeque<BoxedEvent>,
    closed: bool,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, EventBufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, event: BoxedEvent) -> Result<(), ApplicationError> {
        let mut state = self.state();
        if state.closed {
            return Err(AppError::UnitOfWorkClosed.into());
        }
        tracing::trace!(event = event.name(), event_id = %event.id(), "Event collected");
        state.events.push_back(event);
        Ok(())
    }

    /// Takes every buffered event, oldest first.
    pub fn drain(&self) -> Vec<BoxedEvent> {
        self.state().events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.state().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().events.is_empty()
    }

    /// Discards pending events and rejects further appends.
    pub fn close(&self) {
        let mut state = self.state();
        state.events.clear();
        state.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

/// A Unit of Work (UoW) works as a provider for repositories
/// that all operate within a single transaction, and collects the events
/// produced while the transaction is open.
#[async_trait::async_trait]
pub trait UnitOfWork: Send + Sync {
    // Methods to access transactional repositories
    fn users(&self) -> Arc<dyn UserRepository>;
    fn groups(&self) -> Arc<dyn GroupRepository>;

    fn events(&self) -> &EventBuffer;

    // Transaction control methods.
    // The UoW stays usable after commit: the next operation starts a new transaction.
    async fn commit(&self) -> Result<(), ApplicationError>;
    async fn rollback(&self) -> Result<(), ApplicationError>;

    /// Leaves the scope: uncommitted changes are rolled back and no more events are accepted.
    /// Safe to call more than once.
    /// The buffer is closed even when the rollback fails.
    async fn close(&self) -> Result<(), ApplicationError> {
        let rolled_back = self.rollback().await;
        self.events().close();
        rolled_back
    }
}

pub trait UnitOfWorkExt {
    fn add_event<E: Event>(&self, event: E) -> Result<(), ApplicationError>;
}

impl<U: UnitOfWork + ?Sized> UnitOfWorkExt for U {
    fn add_event<E: Event>(&self, event: E) -> Result<(), ApplicationError> {
        self.events().push(event.into())
    }
}

/// A factory for creating Unit of Work instances.
#[async_trait::async_trait]
pub trait UnitOfWorkProvider: Send + Sync {
    /// Begin a new Unit of Work (transaction) with an empty event buffer.
    async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, ApplicationError>;
}
