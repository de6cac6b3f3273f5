//! Status enums for orders, payments, and users.
//!
//! Wire names (serde) follow what the shop frontend already consumes;
//! database names (sqlx) are the snake_case labels of the `shop.*` enum types.

use serde::{Deserialize, Serialize};

/// How the customer intends to pay for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
pub enum PaymentMethod {
    /// Online payment through the Paystack gateway.
    #[default]
    Paystack,
    /// Cash collected by the courier.
    #[serde(rename = "Pay on Delivery")]
    PayOnDelivery,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    /// Accepts the wire names and the database labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paystack" | "paystack" => Ok(Self::Paystack),
            "Pay on Delivery" | "pay_on_delivery" => Ok(Self::PayOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment state of an order.
///
/// Any non-paid status moves to `Paid` exactly once; nothing leaves `Paid`.
/// `Failed` is reserved for gateway-reported failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_status", rename_all = "snake_case")
)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "Not Paid")]
    NotPaid,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "failed")]
    Failed,
}

impl PaymentStatus {
    /// Initial status for a freshly created order.
    #[must_use]
    pub const fn initial_for(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Paystack => Self::Pending,
            PaymentMethod::PayOnDelivery => Self::NotPaid,
        }
    }

    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }

    /// Whether a payment confirmation may move an order out of this status.
    ///
    /// Everything except `Paid` accepts one: a customer who retries after a
    /// failed attempt and succeeds must still end up paid.
    #[must_use]
    pub const fn accepts_confirmation(self) -> bool {
        !self.is_paid()
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "Not Paid" | "not_paid" => Ok(Self::NotPaid),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether an operator may move an order from `self` to `next`.
    ///
    /// Processing → Shipped → Delivered, and Processing/Shipped → Cancelled.
    /// Delivered and Cancelled are terminal. Re-applying the current status is
    /// allowed so retried operator requests succeed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Processing | Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Shipped | Self::Delivered | Self::Cancelled)
                | (Self::Delivered, Self::Delivered)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Access level of a shop user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Whether a user may use the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_status", rename_all = "snake_case")
)]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
}

impl UserStatus {
    /// The status an admin toggle moves to.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Blocked,
            Self::Blocked => Self::Active,
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" | "active" => Ok(Self::Active),
            "Blocked" | "blocked" => Ok(Self::Blocked),
            _ => Err(format!("invalid user status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(
            PaymentStatus::initial_for(PaymentMethod::Paystack),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::initial_for(PaymentMethod::PayOnDelivery),
            PaymentStatus::NotPaid
        );
    }

    #[test]
    fn test_paid_is_terminal_for_confirmation() {
        assert!(PaymentStatus::Pending.accepts_confirmation());
        assert!(PaymentStatus::NotPaid.accepts_confirmation());
        assert!(PaymentStatus::Failed.accepts_confirmation());
        assert!(!PaymentStatus::Paid.accepts_confirmation());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::NotPaid).unwrap(),
            "\"Not Paid\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::PayOnDelivery).unwrap(),
            "\"Pay on Delivery\""
        );
        let method: PaymentMethod = serde_json::from_str("\"Paystack\"").unwrap();
        assert_eq!(method, PaymentMethod::Paystack);
        assert_eq!(
            "Pay on Delivery".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::PayOnDelivery
        );
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::{Cancelled, Delivered, Processing, Shipped};

        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));

        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Delivered));
    }

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_user_status_toggle_and_parse() {
        assert_eq!(UserStatus::Active.toggled(), UserStatus::Blocked);
        assert_eq!(UserStatus::Blocked.toggled(), UserStatus::Active);
        assert_eq!(
            serde_json::to_string(&UserStatus::Blocked).unwrap(),
            "\"Blocked\""
        );
        assert_eq!("blocked".parse::<UserStatus>().unwrap(), UserStatus::Blocked);
        assert_eq!("Active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("banned".parse::<UserStatus>().is_err());
        assert!("owner".parse::<UserRole>().is_err());
    }
}
