//! Order model.
//!
//! An order snapshots the cart at checkout time: item names, unit prices, and
//! the total never change afterwards, whatever happens to the catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wear_with_pride_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId};

/// Snapshot of one purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price at checkout.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_image: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Where the order ships. Stored as given by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Check that the fields a courier needs are present.
    ///
    /// # Errors
    ///
    /// Returns the name of the first missing field.
    pub fn validate(&self) -> Result<(), &'static str> {
        for (field, value) in [
            ("address", &self.address),
            ("city", &self.city),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                return Err(field);
            }
        }
        Ok(())
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Set once the purchased quantities have been taken out of stock.
    pub stock_committed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.payment_status.is_paid()
    }

    /// Paid, but the stock commit has not run yet.
    #[must_use]
    pub const fn awaits_stock_commit(&self) -> bool {
        self.is_paid() && self.stock_committed_at.is_none()
    }

    /// Payment status as shown to operators: unpaid orders read as
    /// `Not Paid` for pay-on-delivery and `pending` for Paystack.
    #[must_use]
    pub const fn display_payment_status(&self) -> PaymentStatus {
        if self.is_paid() {
            return PaymentStatus::Paid;
        }
        match self.payment_method {
            PaymentMethod::PayOnDelivery => PaymentStatus::NotPaid,
            PaymentMethod::Paystack => PaymentStatus::Pending,
        }
    }

    /// Record a fulfillment status change and stamp its timestamp.
    ///
    /// Callers check [`OrderStatus::can_transition_to`] first.
    pub fn apply_status(&mut self, next: OrderStatus, at: DateTime<Utc>) {
        match next {
            OrderStatus::Shipped => self.shipped_at = self.shipped_at.or(Some(at)),
            OrderStatus::Delivered => self.delivered_at = self.delivered_at.or(Some(at)),
            OrderStatus::Cancelled => self.cancelled_at = self.cancelled_at.or(Some(at)),
            OrderStatus::Processing => {}
        }
        self.order_status = next;
        self.updated_at = at;
    }
}

/// An order about to be inserted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

impl NewOrder {
    /// Build an unpaid order whose total is the sum of its lines.
    #[must_use]
    pub fn new(
        user_id: UserId,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Self {
        let total_amount = items.iter().map(OrderItem::line_total).sum();
        Self {
            user_id,
            items,
            shipping_address,
            total_amount,
            payment_method,
            payment_status: PaymentStatus::initial_for(payment_method),
        }
    }
}

/// Operator listing filter. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub page: u32,
    pub limit: u32,
}

impl OrderFilter {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp paging to sane values: page ≥ 1, 1 ≤ limit ≤ `MAX_LIMIT`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = match self.limit {
            0 => Self::DEFAULT_LIMIT,
            n => n.min(Self::MAX_LIMIT),
        };
        self
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Whether `order` passes the filter (paging not considered).
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.payment_method.is_none_or(|m| m == order.payment_method)
            && self.payment_status.is_none_or(|s| s == order.payment_status)
            && self.order_status.is_none_or(|s| s == order.order_status)
    }
}
