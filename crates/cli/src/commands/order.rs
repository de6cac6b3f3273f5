//! Order management commands.

use wear_with_pride_api::db::PgStore;
use wear_with_pride_api::services::orders::OrderService;
use wear_with_pride_core::{OrderId, OrderStatus};

use super::{CliError, connect};

/// Move an order to `status`, subject to the usual transition rules.
pub async fn set_status(id: OrderId, status: OrderStatus) -> Result<(), CliError> {
    let store = PgStore::new(connect().await?);
    let order = OrderService::new(&store).update_status(id, status).await?;

    tracing::info!(
        order_id = %order.id,
        status = %order.order_status,
        "Order status updated"
    );
    Ok(())
}
