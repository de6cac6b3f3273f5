//! Checkout recovery.
//!
//! A confirmation marks the order paid before it commits stock. If the
//! process dies in between, the order stays paid with stock untouched until
//! the next confirmation for it arrives. `resume` finishes those orders now.
//!
//! Uses the same environment as the API server.

use wear_with_pride_api::config::ApiConfig;
use wear_with_pride_api::db::PgStore;
use wear_with_pride_api::services::checkout::CheckoutService;
use wear_with_pride_api::services::paystack::PaystackClient;

use super::{CliError, connect};

/// Commit stock and clear carts for every half-confirmed order.
pub async fn resume() -> Result<(), CliError> {
    let config = ApiConfig::from_env()?;
    let store = PgStore::new(connect().await?);
    let gateway = PaystackClient::new(&config.paystack)?;

    let completed = CheckoutService::new(&store, &gateway, config.paystack.currency)
        .resume_stock_commits()
        .await?;

    tracing::info!(orders = completed, "Stock commit recovery complete");
    Ok(())
}
