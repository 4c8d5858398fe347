mod command;
mod event;
mod message;
mod query;

pub mod commands;
pub mod events;
pub mod queries;

pub use command::*;
pub use event::*;
pub use message::*;
pub use query::*;
