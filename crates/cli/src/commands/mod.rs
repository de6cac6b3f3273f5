//! CLI command implementations.

pub mod checkout;
pub mod migrate;
pub mod order;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use wear_with_pride_api::config::ConfigError;
use wear_with_pride_api::services::checkout::CheckoutError;
use wear_with_pride_api::services::orders::OrderError;
use wear_with_pride_api::services::payments::GatewayError;
use wear_with_pride_api::services::users::UserError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("User error: {0}")]
    User(#[from] UserError),
}

/// Connect using `WWP_DATABASE_URL`, falling back to `DATABASE_URL`.
async fn connect() -> Result<PgPool, CliError> {
    let _ = dotenvy::dotenv();

    let url = std::env::var("WWP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("WWP_DATABASE_URL"))?;

    tracing::info!("Connecting to shop database...");
    Ok(wear_with_pride_api::db::create_pool(&SecretString::from(url)).await?)
}
