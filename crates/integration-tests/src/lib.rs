//! Integration tests for Wear With Pride.
//!
//! The tests drive the public API of `wear-with-pride-api` end to end on the
//! in-memory store and a scripted Paystack double, so they need no database
//! or network:
//!
//! ```bash
//! cargo test -p wear-with-pride-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `checkout_flow` - cart to paid order, stock and cart effects
//! - `payment_idempotency` - repeated and concurrent confirmations
//! - `webhook` - signed deliveries through the HTTP router

use std::sync::Arc;

use axum::Router;
use rust_decimal::Decimal;

use wear_with_pride_api::app::build_router;
use wear_with_pride_api::models::{Cart, NewCartLine, ShippingAddress};
use wear_with_pride_api::services::checkout::{CheckoutRequest, CheckoutService};
use wear_with_pride_api::state::AppState;
use wear_with_pride_api::store::{CartStore, CatalogStore, MemoryStore};
use wear_with_pride_api::testing::{ScriptedGateway, test_config};
use wear_with_pride_core::{CurrencyCode, PaymentMethod, ProductId, UserId, UserRole};

/// The shopper in every scenario.
pub const BUYER: UserId = UserId::new(1);
/// Tee: 1000 each, 5 in stock.
pub const TEE: ProductId = ProductId::new(1);
/// Cap: 500 each, 3 in stock.
pub const CAP: ProductId = ProductId::new(2);

/// A seeded shop on the in-memory store.
pub struct Shop {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
}

impl Shop {
    /// One buyer and two products.
    pub async fn seeded() -> Self {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_user(1, "ada@wearwithpride.ng", UserRole::User)
            .await;
        store
            .insert_product(1, "Pride Tee", Decimal::new(1000, 0), 5)
            .await;
        store
            .insert_product(2, "Rainbow Cap", Decimal::new(500, 0), 3)
            .await;

        Self {
            store,
            gateway: Arc::new(ScriptedGateway::new()),
        }
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(self.store.as_ref(), self.gateway.as_ref(), CurrencyCode::NGN)
    }

    /// Router wired to this shop, as the binary would serve it.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(AppState::new(
            test_config(),
            self.store.clone(),
            self.gateway.clone(),
        ))
    }

    /// Put `lines` of `(product, quantity)` in the buyer's cart at current
    /// prices.
    ///
    /// # Panics
    ///
    /// Panics if a product is unknown or the store fails.
    #[allow(clippy::unwrap_used)]
    pub async fn fill_cart(&self, lines: &[(ProductId, u32)]) {
        let mut cart = self
            .store
            .cart(BUYER)
            .await
            .unwrap()
            .unwrap_or_else(|| Cart::new(BUYER));
        for &(product_id, quantity) in lines {
            let product = self.store.product(product_id).await.unwrap().unwrap();
            cart.add(NewCartLine {
                product_id,
                quantity,
                unit_price: product.unit_price(),
                size: None,
                color: None,
                selected_image: None,
            });
        }
        self.store.save_cart(&cart).await.unwrap();
    }
}

/// A deliverable Lagos address.
#[must_use]
pub fn lagos_address() -> ShippingAddress {
    ShippingAddress {
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        address: "12 Admiralty Way".to_string(),
        city: "Lagos".to_string(),
        postal_code: "101233".to_string(),
        country: "Nigeria".to_string(),
        phone: "+2348000000000".to_string(),
    }
}

/// Checkout request paying through Paystack.
#[must_use]
pub fn paystack_checkout() -> CheckoutRequest {
    CheckoutRequest {
        payment_method: Some(PaymentMethod::Paystack),
        shipping_address: lagos_address(),
    }
}
