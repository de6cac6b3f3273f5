//! Paystack webhook authentication and payload parsing.
//!
//! Paystack signs each webhook with HMAC-SHA512 over the raw request body,
//! keyed by the account's secret key, and sends the lowercase hex digest in
//! the `x-paystack-signature` header. The digest must be computed over the
//! exact bytes received; re-serialized JSON will not match.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha512;
use thiserror::Error;

use wear_with_pride_core::OrderId;

use super::types::metadata_order_id;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Event name for a settled charge.
pub const CHARGE_SUCCESS: &str = "charge.success";

type HmacSha512 = Hmac<Sha512>;

/// Reasons a webhook signature is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("signature is not valid hex")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verifies webhook signatures against the gateway secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Check `signature` against the HMAC-SHA512 of `body`.
    ///
    /// Comparison is constant time.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the signature is absent, not hex, or
    /// does not match.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::Missing)?;
        let provided = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

        self.mac(body)
            .ok_or(SignatureError::Mismatch)?
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Lowercase hex signature for `body`, as Paystack would send it.
    #[must_use]
    pub fn sign(&self, body: &[u8]) -> Option<String> {
        self.mac(body)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self, body: &[u8]) -> Option<HmacSha512> {
        let mut mac =
            <HmacSha512 as Mac>::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(body);
        Some(mac)
    }
}

/// Envelope of every webhook delivery.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// The parts of a `charge.success` event the shop acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeSuccess {
    pub reference: Option<String>,
    /// `None` when metadata is missing or `orderId` does not parse.
    pub order_id: Option<OrderId>,
    pub customer_email: Option<String>,
}

impl WebhookEvent {
    /// Details of a `charge.success` event; `None` for any other event.
    #[must_use]
    pub fn charge_success(&self) -> Option<ChargeSuccess> {
        if self.event != CHARGE_SUCCESS {
            return None;
        }
        let text = |v: &Value| v.as_str().map(str::to_string);

        Some(ChargeSuccess {
            reference: self.data.get("reference").and_then(text),
            order_id: self.data.get("metadata").and_then(metadata_order_id),
            customer_email: self
                .data
                .get("customer")
                .and_then(|c| c.get("email"))
                .and_then(text),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::from("sk_test_webhook_secret_0123456789"))
    }

    #[test]
    fn test_valid_signature() {
        let v = verifier();
        let body = br#"{"event":"charge.success","data":{}}"#;
        let signature = v.sign(body).unwrap();
        assert_eq!(signature.len(), 128);
        assert_eq!(v.verify(body, Some(&signature)), Ok(()));
        assert_eq!(v.verify(body, Some(&signature.to_uppercase())), Ok(()));
    }

    #[test]
    fn test_missing_signature() {
        let v = verifier();
        assert_eq!(v.verify(b"{}", None), Err(SignatureError::Missing));
        assert_eq!(v.verify(b"{}", Some("  ")), Err(SignatureError::Missing));
    }

    #[test]
    fn test_malformed_signature() {
        assert_eq!(
            verifier().verify(b"{}", Some("not-hex")),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let v = verifier();
        let signature = v.sign(br#"{"amount":100}"#).unwrap();
        assert_eq!(
            v.verify(br#"{"amount":900}"#, Some(&signature)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_signature_is_over_raw_bytes() {
        let v = verifier();
        let compact = br#"{"event":"charge.success"}"#;
        let spaced = br#"{ "event": "charge.success" }"#;
        let signature = v.sign(compact).unwrap();
        assert_eq!(
            v.verify(spaced, Some(&signature)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let body = b"{}";
        let other = WebhookVerifier::new(SecretString::from("sk_test_some_other_secret_value_42"));
        assert_eq!(
            verifier().verify(body, Some(&other.sign(body).unwrap())),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_charge_success_extraction() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "event": "charge.success",
                "data": {
                    "reference": "order_5_1700000000000",
                    "metadata": {"orderId": "5"},
                    "customer": {"email": "buyer@shop.ng"}
                }
            }"#,
        )
        .unwrap();

        let charge = event.charge_success().unwrap();
        assert_eq!(charge.reference.as_deref(), Some("order_5_1700000000000"));
        assert_eq!(charge.order_id, Some(OrderId::new(5)));
        assert_eq!(charge.customer_email.as_deref(), Some("buyer@shop.ng"));
    }

    #[test]
    fn test_other_events_are_not_charges() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"event":"transfer.success","data":{}}"#).unwrap();
        assert!(event.charge_success().is_none());
    }

    #[test]
    fn test_charge_without_metadata_has_no_order() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"event":"charge.success","data":{"reference":"r"}}"#)
                .unwrap();
        assert_eq!(event.charge_success().unwrap().order_id, None);
    }
}
