pub mod app;
pub mod app_registry;
pub mod auth;
pub mod bootstrap;
pub mod command_handlers;
pub mod config;
pub mod cqrs;
pub mod email;
pub mod event_handlers;
pub mod messagebus;
pub mod queries_handlers;
pub mod registry;
pub mod repository;
pub mod services;
pub mod uow;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
