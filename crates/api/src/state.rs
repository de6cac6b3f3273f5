//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::auth::TokenVerifier;
use crate::services::checkout::CheckoutService;
use crate::services::email::EmailService;
use crate::services::payments::PaymentGateway;
use crate::services::paystack::WebhookVerifier;
use crate::store::Store;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Persistence and the payment gateway sit
/// behind trait objects so tests can swap in in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    tokens: TokenVerifier,
    webhooks: WebhookVerifier,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state without email.
    ///
    /// Token and webhook verifiers are derived from the configured secrets.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self::with_email(config, store, gateway, None)
    }

    /// Create a new application state that sends receipts through `email`.
    #[must_use]
    pub fn with_email(
        config: ApiConfig,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        email: Option<EmailService>,
    ) -> Self {
        let tokens = TokenVerifier::new(&config.jwt_secret);
        let webhooks = WebhookVerifier::new(config.paystack.secret_key.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
                tokens,
                webhooks,
                email,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }

    /// Get a reference to the bearer-token verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenVerifier {
        &self.inner.tokens
    }

    /// Get a reference to the webhook signature verifier.
    #[must_use]
    pub fn webhooks(&self) -> &WebhookVerifier {
        &self.inner.webhooks
    }

    /// Email service, when SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Checkout orchestrator bound to this state's store and gateway.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            self.store(),
            self.gateway(),
            self.inner.config.paystack.currency,
        )
    }
}
