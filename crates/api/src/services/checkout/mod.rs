//! Checkout and payment reconciliation.
//!
//! [`CheckoutService`] owns the order lifecycle from cart to paid order:
//!
//! 1. [`create_checkout`](CheckoutService::create_checkout) snapshots the
//!    cart into an unpaid order after a stock check. Nothing else changes.
//! 2. [`initialize_payment`](CheckoutService::initialize_payment) opens a
//!    gateway transaction for the order total in minor units.
//! 3. Confirmation arrives by client verification
//!    ([`verify_payment`](CheckoutService::verify_payment)) or by webhook;
//!    both funnel into [`confirm_payment`](CheckoutService::confirm_payment).
//!
//! Confirmation is idempotent. The order is flipped to paid by a conditional
//! write, then stock and the owner's cart are committed together under their
//! own exactly-once guard. A retried or concurrent confirmation of a paid
//! order, by either path, changes nothing except that it finishes a commit
//! an earlier attempt never reached.

mod error;

pub use error::CheckoutError;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wear_with_pride_core::{
    CurrencyCode, Email, OrderId, PaymentMethod, ProductId, UserId, to_minor_units,
};

use crate::models::{NewOrder, Order, OrderItem, Product, ShippingAddress};
use crate::services::payments::{Authorization, PaymentGateway, TransactionRequest};
use crate::store::Store;

/// Checkout request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub amount: Decimal,
}

/// Outcome of a payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// This call moved the order to paid.
    Applied(Order),
    /// The order was already paid; nothing was re-applied.
    AlreadyPaid(Order),
}

impl Confirmation {
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Applied(order) | Self::AlreadyPaid(order) => order,
        }
    }

    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(order) | Self::AlreadyPaid(order) => order,
        }
    }

    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Gateway reference for a payment attempt: `order_{id}_{unix millis}`.
#[must_use]
pub fn payment_reference(order_id: OrderId, at: DateTime<Utc>) -> String {
    format!("order_{order_id}_{}", at.timestamp_millis())
}

/// Checkout orchestrator.
pub struct CheckoutService<'a> {
    store: &'a dyn Store,
    gateway: &'a dyn PaymentGateway,
    currency: CurrencyCode,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        gateway: &'a dyn PaymentGateway,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            store,
            gateway,
            currency,
        }
    }

    /// Turn the user's cart into an unpaid order.
    ///
    /// Stock is checked against the quantity requested per product across all
    /// cart lines. Stock, cart, and payment state are left untouched.
    ///
    /// # Errors
    ///
    /// - `EmptyCart` if the user has no cart or no lines
    /// - `ProductUnavailable` if a line's product no longer exists
    /// - `InsufficientStock` if any product cannot cover its quantity
    /// - `InvalidShippingAddress` if the courier fields are missing
    #[tracing::instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_checkout(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let cart = self
            .store
            .cart(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(CheckoutError::EmptyCart)?;

        let products: HashMap<ProductId, Product> = self
            .store
            .products(&cart.product_ids())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for (product_id, requested) in cart.requested_quantities() {
            let product = products
                .get(&product_id)
                .ok_or(CheckoutError::ProductUnavailable(product_id))?;
            if !product.has_stock_for(requested) {
                return Err(CheckoutError::InsufficientStock {
                    product_id,
                    product: product.name.clone(),
                    requested,
                    available: product.stock,
                });
            }
        }

        request
            .shipping_address
            .validate()
            .map_err(CheckoutError::InvalidShippingAddress)?;

        let items = cart
            .items()
            .iter()
            .map(|item| {
                let product = products
                    .get(&item.product_id)
                    .ok_or(CheckoutError::ProductUnavailable(item.product_id))?;
                Ok(OrderItem {
                    product_id: item.product_id,
                    name: product.name.clone(),
                    price: item.price_at_time,
                    quantity: item.quantity,
                    size: item.size.clone(),
                    color: item.color.clone(),
                    image: product.image_url.clone(),
                    selected_image: item.selected_image.clone(),
                })
            })
            .collect::<Result<Vec<_>, CheckoutError>>()?;

        let order = self
            .store
            .create_order(NewOrder::new(
                user_id,
                items,
                request.shipping_address,
                request.payment_method.unwrap_or_default(),
            ))
            .await?;

        tracing::info!(
            order_id = %order.id,
            amount = %order.total_amount,
            payment_method = ?order.payment_method,
            "Order created"
        );

        Ok(CheckoutReceipt {
            order_id: order.id,
            amount: order.total_amount,
        })
    }

    /// Open a gateway transaction for an unpaid order owned by `user_id`.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist or belongs to someone else
    /// - `AlreadyPaid` if the order is paid
    /// - `GatewayRejected` / `GatewayUnavailable` on gateway failure
    #[tracing::instrument(skip(self, email), fields(user_id = %user_id, order_id = %order_id))]
    pub async fn initialize_payment(
        &self,
        user_id: UserId,
        order_id: OrderId,
        email: Email,
    ) -> Result<Authorization, CheckoutError> {
        let order = self.owned_order(user_id, order_id).await?;
        if order.is_paid() {
            return Err(CheckoutError::AlreadyPaid(order_id));
        }

        let amount_minor =
            to_minor_units(order.total_amount).ok_or(CheckoutError::InvalidAmount(order_id))?;

        let request = TransactionRequest {
            order_id,
            email,
            amount_minor,
            currency: self.currency,
            reference: payment_reference(order_id, Utc::now()),
        };

        let authorization = self.gateway.initialize(&request).await?;
        tracing::info!(reference = %authorization.reference, "Payment initialized");
        Ok(authorization)
    }

    /// Confirm a payment the client reports as complete.
    ///
    /// A paid order short-circuits without calling the gateway, finishing a
    /// stock commit an earlier attempt left undone. Otherwise the
    /// gateway must report a successful charge for exactly the order total,
    /// and for this order when it echoes an order id.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist or belongs to someone else
    /// - `PaymentVerification` if the transaction does not settle the order
    /// - `GatewayRejected` / `GatewayUnavailable` on gateway failure
    #[tracing::instrument(skip(self), fields(user_id = %user_id, order_id = %order_id))]
    pub async fn verify_payment(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reference: &str,
    ) -> Result<Confirmation, CheckoutError> {
        let order = self.owned_order(user_id, order_id).await?;
        if order.is_paid() {
            return self.already_paid(order).await;
        }

        let txn = self.gateway.verify(reference).await?;

        if !txn.succeeded() {
            tracing::warn!(gateway_status = %txn.status, "Transaction not successful");
            return Err(CheckoutError::PaymentVerification(format!(
                "transaction status is {}",
                txn.status
            )));
        }

        let expected =
            to_minor_units(order.total_amount).ok_or(CheckoutError::InvalidAmount(order_id))?;
        if txn.amount_minor != expected {
            tracing::warn!(
                expected,
                charged = txn.amount_minor,
                "Transaction amount does not match order total"
            );
            return Err(CheckoutError::PaymentVerification(
                "amount does not match order total".to_string(),
            ));
        }

        if let Some(paid_for) = txn.order_id.filter(|id| *id != order_id) {
            tracing::warn!(paid_for = %paid_for, "Transaction belongs to another order");
            return Err(CheckoutError::PaymentVerification(
                "transaction belongs to another order".to_string(),
            ));
        }

        self.confirm_payment(order_id, reference).await
    }

    /// Apply a confirmed payment to an order. Shared by client verification
    /// and the webhook.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist
    /// - `Repository` if a write fails; the call is safe to retry
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        reference: &str,
    ) -> Result<Confirmation, CheckoutError> {
        if let Some(order) = self.store.mark_paid(order_id, reference, Utc::now()).await? {
            tracing::info!(reference = %reference, "Order marked paid");
            self.settle(&order).await?;
            return Ok(Confirmation::Applied(order));
        }

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        self.already_paid(order).await
    }

    async fn already_paid(&self, order: Order) -> Result<Confirmation, CheckoutError> {
        if order.awaits_stock_commit() {
            tracing::warn!(order_id = %order.id, "Paid order missing stock commit; completing it");
            self.settle(&order).await?;
        }
        Ok(Confirmation::AlreadyPaid(order))
    }

    /// Commit stock for every paid order an earlier confirmation left
    /// half-done. Returns how many orders were completed.
    ///
    /// # Errors
    ///
    /// Returns the first repository failure; completed orders stay completed.
    pub async fn resume_stock_commits(&self) -> Result<usize, CheckoutError> {
        let pending = self.store.orders_awaiting_stock_commit().await?;
        let mut completed = 0;
        for order in pending {
            if self.settle(&order).await? {
                completed += 1;
            }
        }
        Ok(completed)
    }

    /// Commit stock and clear the cart in one store write. Only the first
    /// commit clears the cart, so a new cart is never wiped by a late retry.
    async fn settle(&self, order: &Order) -> Result<bool, CheckoutError> {
        let committed = self.store.commit_stock(order.id).await?;
        if committed {
            tracing::info!(order_id = %order.id, "Stock committed, cart cleared");
        }
        Ok(committed)
    }

    async fn owned_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order, CheckoutError> {
        self.store
            .order(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }
}
