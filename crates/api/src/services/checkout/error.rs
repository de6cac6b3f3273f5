//! Checkout failure taxonomy.

use thiserror::Error;

use wear_with_pride_core::{OrderId, ProductId};

use crate::db::RepositoryError;
use crate::services::payments::GatewayError;

/// Errors from the checkout and payment-confirmation flow.
///
/// Every variant except `Repository` is raised before any write, so a failed
/// call leaves orders, stock, and carts as they were.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("not enough stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        product: String,
        requested: u32,
        available: i32,
    },

    /// A cart line points at a product that no longer exists.
    #[error("product {0} is no longer available")]
    ProductUnavailable(ProductId),

    #[error("invalid shipping address: {0} is required")]
    InvalidShippingAddress(&'static str),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("order {0} is already paid")]
    AlreadyPaid(OrderId),

    /// The order total cannot be expressed in gateway minor units.
    #[error("order {0} has an invalid amount")]
    InvalidAmount(OrderId),

    /// The gateway answered but the transaction does not settle this order.
    #[error("payment verification failed: {0}")]
    PaymentVerification(String),

    #[error("payment gateway rejected request: {0}")]
    GatewayRejected(String),

    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(msg) => Self::GatewayRejected(msg),
            GatewayError::Unavailable(msg) | GatewayError::InvalidResponse(msg) => {
                Self::GatewayUnavailable(msg)
            }
        }
    }
}
