//! Payment gateway seam.
//!
//! The checkout flow depends on [`PaymentGateway`] rather than on the
//! Paystack client directly, so tests can script gateway answers.

use async_trait::async_trait;
use thiserror::Error;

use wear_with_pride_core::{CurrencyCode, Email, OrderId};

/// Errors from a payment gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached, timed out, or answered 5xx.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway answered and refused the request.
    #[error("payment gateway rejected request: {0}")]
    Rejected(String),

    /// The gateway answered with something we could not understand.
    #[error("unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

/// A transaction to open with the gateway.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub order_id: OrderId,
    pub email: Email,
    /// Amount in minor units (kobo for NGN).
    pub amount_minor: i64,
    pub currency: CurrencyCode,
    pub reference: String,
}

/// Where to send the customer to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// The gateway's view of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    pub reference: String,
    /// Gateway status string, `"success"` for a settled charge.
    pub status: String,
    /// Amount charged in minor units.
    pub amount_minor: i64,
    pub currency: Option<String>,
    /// Order id echoed back from the metadata sent at initialization.
    pub order_id: Option<OrderId>,
    pub customer_email: Option<String>,
}

impl VerifiedTransaction {
    pub const SUCCESS: &'static str = "success";

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

/// A payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a transaction and get the hosted payment page for it.
    async fn initialize(&self, request: &TransactionRequest) -> Result<Authorization, GatewayError>;

    /// Ask the gateway for the current state of a transaction.
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;
}
