use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use bistro_core::{AppError, ApplicationError};

/// An event represents something that already happened.
/// It is produced by a handler and appended to the Unit of Work; callers never
/// dispatch events directly.
pub trait Event: fmt::Debug + Send + Sync + 'static {
    /// Unique name of the event, used for tracing and error reporting.
    const NAME: &'static str;
}

/// Reacts to an event. Any number of handlers (including none) may subscribe to an event type.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    async fn handle(&self, event: &E) -> Result<(), ApplicationError>;
}

/// An event whose concrete type has been erased. Cloning is cheap and every clone
/// shares the same event instance.
#[derive(Clone)]
pub struct BoxedEvent {
    id: Uuid,
    name: &'static str,
    type_id: TypeId,
    occurred_at: DateTime<Utc>,
    event: Arc<dyn Any + Send + Sync>,
}

impl BoxedEvent {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn is<E: Event>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }

    pub fn downcast_ref<E: Event>(&self) -> Result<&E, ApplicationError> {
        self.event.downcast_ref::<E>().ok_or_else(|| {
            AppError::MessageTypeMismatch {
                expected: E::NAME,
                found: self.name,
            }
            .into()
        })
    }
}

impl<E: Event> From<E> for BoxedEvent {
    fn from(event: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: E::NAME,
            type_id: TypeId::of::<E>(),
            occurred_at: Utc::now(),
            event: Arc::new(event),
        }
    }
}

impl fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("occurred_at", &self.occurred_at)
            .finish()
    }
}
