//! Paystack wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wear_with_pride_core::OrderId;

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Error bodies only carry the message reliably.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InitializeBody<'a> {
    pub email: &'a str,
    /// Minor units.
    pub amount: i64,
    pub currency: &'a str,
    pub reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<&'a str>,
    pub metadata: InitializeMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeMetadata {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct InitializeData {
    pub authorization_url: String,
    #[serde(default)]
    pub access_code: Option<String>,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionData {
    pub status: String,
    pub reference: String,
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    /// Object when we sent metadata; Paystack sends `""` otherwise.
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub email: Option<String>,
}

/// Pull `metadata.orderId` out of a transaction, accepting a string or a
/// number. Anything else (missing, empty string metadata, garbage) is `None`.
#[must_use]
pub fn metadata_order_id(metadata: &Value) -> Option<OrderId> {
    match metadata.get("orderId")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(OrderId::new),
        _ => None,
    }
}
