//! Wear With Pride API - checkout and payment backend.
//!
//! Serves the cart, checkout, Paystack, order, and admin routes on
//! `WWP_HOST:WWP_PORT` (default 127.0.0.1:5000).
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - `PostgreSQL` (schema `shop`) for users, catalog, carts, and orders
//! - Paystack REST API for payments, confirmed by client verification or
//!   signed webhook
//! - SMTP receipts via lettre when configured
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! `cargo run -p wear-with-pride-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wear_with_pride_api::app::build_router;
use wear_with_pride_api::config::ApiConfig;
use wear_with_pride_api::db::{self, PgStore};
use wear_with_pride_api::services::email::EmailService;
use wear_with_pride_api::services::paystack::PaystackClient;
use wear_with_pride_api::state::AppState;

/// Start Sentry when a DSN is configured. Drop the guard to flush.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Build the mailer, or run without receipts if SMTP is unset or broken.
fn init_email(config: &ApiConfig) -> Option<EmailService> {
    let email_config = config.email.as_ref()?;
    match EmailService::new(email_config) {
        Ok(service) => {
            tracing::info!(smtp_host = %email_config.smtp_host, "Receipt email enabled");
            Some(service)
        }
        Err(e) => {
            tracing::error!(error = %e, "SMTP configuration invalid; receipts disabled");
            None
        }
    }
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() {
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Sentry before tracing so the tracing layer has a client
    let _sentry_guard = init_sentry(&config);

    // RUST_LOG overrides
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wear_with_pride_api=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let paystack =
        PaystackClient::new(&config.paystack).expect("Failed to create Paystack client");
    let email = init_email(&config);

    let state = AppState::with_email(
        config.clone(),
        Arc::new(PgStore::new(pool)),
        Arc::new(paystack),
        email,
    );

    // Finish any stock commits a previous process left half-done
    match state.checkout().resume_stock_commits().await {
        Ok(0) => {}
        Ok(n) => tracing::warn!(orders = n, "Completed interrupted stock commits"),
        Err(e) => tracing::error!(error = %e, "Failed to resume stock commits"),
    }

    let app = build_router(state)
        // Sentry outermost
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Resolves on Ctrl+C or SIGTERM.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
