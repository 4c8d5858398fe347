use std::sync::Arc;

use bistro_app::{
    app::AppBus,
    app_registry::app_registry,
    bootstrap::{Bootstrap, Dependencies},
    config::Config,
    email::{EmailSender, LoggingEmailSender},
};
use bistro_core::{ApplicationError, Result};
use bistro_db::{PostgresUnitOfWorkProvider, establish_connection_pool, run_migrations};

mod logs;
use logs::setup_logging;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    let _log_guard = setup_logging();
    let (_config, _app_bus) = setup_app().await?;

    tracing::info!("Benefit Bistro is ready. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ApplicationError::Infrastructure(e.to_string()))?;
    tracing::info!("Shutting down");

    Ok(())
}

async fn setup_app() -> Result<(Arc<Config>, Arc<AppBus>), ApplicationError> {
    let config = Arc::new(Config::from_env());
    let db_pool = establish_connection_pool().await?;
    run_migrations(&db_pool).await?;

    let registry = Arc::new(app_registry()?);
    tracing::debug!(
        commands = ?registry.command_names(),
        events = ?registry.event_names(),
        "Handlers registered"
    );

    let dependencies = Dependencies::new()
        .with(config.clone())
        .with::<dyn EmailSender>(Arc::new(LoggingEmailSender::new()));
    let bootstrap = Arc::new(Bootstrap::new(registry, dependencies));

    let uow_provider = Arc::new(PostgresUnitOfWorkProvider::new(db_pool));
    let app_bus = Arc::new(AppBus::new(uow_provider, bootstrap));

    Ok((config, app_bus))
}
