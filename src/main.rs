// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Receives contact form submissions from the portfolio site on
//! `POST /api/contact`, validates them, rate limits each client and relays
//! accepted messages to the site owner over SMTP.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file in the
//! working directory is read first):
//!
//! - `BIND_ADDR` / `PORT`: Server bind address (default: 0.0.0.0:5002)
//! - `RATE_LIMIT_MAX`: Submissions per client per window (default: 5)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 900)
//! - `EMAIL_USER`, `EMAIL_PASS`: SMTP credentials (required)
//! - `EMAIL_TO`: Address receiving contact messages (required)
//! - `SMTP_HOST`: SMTP relay (default: smtp.gmail.com)
//! - `ALLOWED_ORIGINS`: CORS origins, comma separated (default: *)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::Config,
    contact::{ContactService, ContactServiceConfig},
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    notifier::SmtpNotifier,
    validator::ContactValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests_per_window,
        smtp_host = %config.mail.smtp_host,
        "Starting contact relay"
    );

    let notifier = SmtpNotifier::new(&config.mail)?;
    match notifier.ping().await {
        Ok(()) => info!(smtp_host = %config.mail.smtp_host, "SMTP relay reachable"),
        Err(e) => warn!(error = %e, "SMTP relay check failed, messages may not be delivered"),
    }

    // Create application state
    let service = ContactService::new(
        ContactValidator::new(config.validation.clone()),
        RateLimiter::new(config.rate_limit.clone()),
        notifier,
        ContactServiceConfig {
            recipient: config.mail.recipient.parse()?,
            dispatch_timeout: config.mail.dispatch_timeout(),
        },
        Metrics::new()?,
    );

    let state = Arc::new(AppState {
        service,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_state = Arc::clone(&state);
    let cleanup_interval = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            cleanup_state.service.limiter().cleanup().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received, draining connections");
}
