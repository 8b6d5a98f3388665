use crate::models::config::LoggingConfig;
use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs stdout and JSON file logging. The returned guard flushes the
/// file writer on drop and must live as long as the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)?;

    let file_appender = tracing_appender::rolling::daily(&config.directory, "gateway.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = format!("{},tower_http=warn,hyper=warn", config.level);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false).json())
        .try_init()?;

    info!(directory = %config.directory, "Logging initialized");
    Ok(guard)
}
