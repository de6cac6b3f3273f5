//! Database migration command.
//!
//! Applies `crates/api/migrations/` to the database named by
//! `WWP_DATABASE_URL` (or `DATABASE_URL`).

use super::{CliError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running shop migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Shop migrations complete!");
    Ok(())
}
