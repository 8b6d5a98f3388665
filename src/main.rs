use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

mod errors;
mod handlers;
mod models;
mod services;
mod utils;

use handlers::{create_app, AppState};
use models::config::AppConfig;
use services::gemini::GeminiProvider;
use services::rate_limit::RateLimiter;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Initialize logging
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting moodboard gateway v{}", env!("CARGO_PKG_VERSION"));

    config.finalize()?;
    info!(auth_enabled = config.auth.enabled, "Configuration loaded successfully");

    let provider = Arc::new(GeminiProvider::new(&config.provider)?);
    let state = AppState::new(config.clone(), provider)?;

    if !state.generator.is_configured() {
        warn!("GEMINI_API_KEY not set; generation endpoints will answer 500");
    }

    // Evict expired rate-limit windows
    let limiter = Arc::clone(&state.limiter);
    let sweep_interval = config.rate_limit.sweep_interval_secs.max(1);
    tokio::spawn(async move {
        rate_limit_sweep_loop(limiter, sweep_interval).await;
    });

    // Create and run the web server
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn rate_limit_sweep_loop(limiter: Arc<RateLimiter>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let evicted = limiter.sweep();
        if evicted > 0 {
            debug!(evicted, remaining = limiter.tracked_keys(), "Swept rate-limit windows");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
