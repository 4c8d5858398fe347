use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::DefaultFields, format::Format},
    prelude::*,
};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "bistro.log";

/// Used when `RUST_LOG` is unset: our crates at debug, dependencies at info.
const DEFAULT_FILTER: &str = "info,bistro_app=debug,bistro_db=debug,bistro_server=debug";

/// Installs the global subscriber: stdout plus a daily rotated `logs/bistro.log`.
///
/// Keep the returned guard alive until exit; dropping it stops the file writer.
pub fn setup_logging() -> WorkerGuard {
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, LOG_FILE));

    tracing_subscriber::registry()
        .with(log_filter())
        .with(event_layer(file_writer, false))
        .with(event_layer(std::io::stdout, true))
        .init();

    guard
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn event_layer<S, W>(writer: W, ansi: bool) -> fmt::Layer<S, DefaultFields, Format, W>
where
    W: for<'w> fmt::MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_thread_ids(true)
        .with_target(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
