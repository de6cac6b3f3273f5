//! Test doubles shared by unit tests and the integration-test crate.
//!
//! Enabled with `cfg(test)` or the `test-utils` feature.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use wear_with_pride_core::{CurrencyCode, OrderId, UserId};

use crate::config::{ApiConfig, PaystackConfig};
use crate::services::auth::Claims;
use crate::services::payments::{
    Authorization, GatewayError, PaymentGateway, TransactionRequest, VerifiedTransaction,
};

/// JWT secret used by [`test_config`].
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-4f1c9a7e2b6d8035c1e9f7a2";

/// Paystack secret used by [`test_config`]; also the webhook HMAC key.
pub const TEST_PAYSTACK_SECRET: &str = "sk_test_4b7e1d9a2c6f8035e1c9a7f2d4b6e8a0";

/// Configuration suitable for tests: no database, no mail, no Sentry.
///
/// # Panics
///
/// Never in practice; the literal URLs are valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/wwp_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        allowed_origins: Vec::new(),
        paystack: PaystackConfig {
            secret_key: SecretString::from(TEST_PAYSTACK_SECRET),
            base_url: Url::parse("https://api.paystack.test").unwrap(),
            callback_url: None,
            currency: CurrencyCode::NGN,
            timeout: Duration::from_secs(5),
        },
        email: None,
        sentry_dsn: None,
        sentry_environment: Some("test".to_string()),
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A bearer token for `user_id`, valid for an hour, signed with `secret`.
///
/// # Panics
///
/// Panics if encoding fails, which only happens for malformed keys.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn bearer_token(secret: &SecretString, user_id: UserId) -> String {
    let claims = Claims {
        id: user_id,
        exp: usize::try_from(chrono::Utc::now().timestamp() + 3600).unwrap(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .unwrap()
}

/// How a scripted gateway call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Rejected,
    Unavailable,
}

/// [`PaymentGateway`] that answers from a script.
///
/// `verify` returns whatever transaction was scripted for the reference and
/// rejects unknown references, like Paystack does.
#[derive(Default)]
pub struct ScriptedGateway {
    transactions: Mutex<HashMap<String, VerifiedTransaction>>,
    failure: Mutex<Option<ScriptedFailure>>,
    initialized: Mutex<Vec<TransactionRequest>>,
    verify_calls: AtomicUsize,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful charge of `amount_minor` for `order_id`.
    pub fn settle(&self, reference: &str, order_id: OrderId, amount_minor: i64) {
        self.script(VerifiedTransaction {
            reference: reference.to_string(),
            status: VerifiedTransaction::SUCCESS.to_string(),
            amount_minor,
            currency: Some("NGN".to_string()),
            order_id: Some(order_id),
            customer_email: None,
        });
    }

    /// Script an arbitrary transaction.
    pub fn script(&self, txn: VerifiedTransaction) {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(txn.reference.clone(), txn);
    }

    /// Make every call fail (or stop failing with `None`).
    pub fn fail_with(&self, failure: Option<ScriptedFailure>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
    }

    /// Requests received by `initialize`, in order.
    #[must_use]
    pub fn initialized(&self) -> Vec<TransactionRequest> {
        self.initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `verify` calls received.
    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn scripted_failure(&self) -> Option<GatewayError> {
        let failure = *self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        failure.map(|f| match f {
            ScriptedFailure::Rejected => GatewayError::Rejected("scripted rejection".to_string()),
            ScriptedFailure::Unavailable => {
                GatewayError::Unavailable("scripted outage".to_string())
            }
        })
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initialize(&self, request: &TransactionRequest) -> Result<Authorization, GatewayError> {
        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }
        self.initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(Authorization {
            authorization_url: format!("https://checkout.paystack.test/{}", request.reference),
            access_code: Some(format!("access_{}", request.order_id)),
            reference: request.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected("Transaction reference not found".to_string()))
    }
}
