//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see a
//! `{"message": "..."}` body with a safe message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::orders::OrderError;
use crate::services::paystack::SignatureError;
use crate::services::users::UserError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout or payment confirmation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order lookup or status change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Operator user management failed.
    #[error("User error: {0}")]
    User(#[from] UserError),

    /// Authentication or authorization failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Webhook signature did not verify.
    #[error("Webhook signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::InvalidShippingAddress(_)
                | CheckoutError::PaymentVerification(_) => StatusCode::BAD_REQUEST,
                CheckoutError::InsufficientStock { .. }
                | CheckoutError::ProductUnavailable(_)
                | CheckoutError::AlreadyPaid(_) => StatusCode::CONFLICT,
                CheckoutError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::GatewayRejected(_) => StatusCode::PAYMENT_REQUIRED,
                CheckoutError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::InvalidAmount(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity => StatusCode::BAD_REQUEST,
                CartError::ProductNotFound(_)
                | CartError::CartNotFound
                | CartError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderError::InvalidTransition { .. } | OrderError::Conflict(_) => {
                    StatusCode::CONFLICT
                }
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::User(err) => match err {
                UserError::NotFound(_) => StatusCode::NOT_FOUND,
                UserError::OwnAccount(_) => StatusCode::BAD_REQUEST,
                UserError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::MissingToken
                | AuthError::TokenExpired
                | AuthError::InvalidToken
                | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
                AuthError::Blocked | AuthError::NotAdmin => StatusCode::FORBIDDEN,
                AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Signature(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show a client.
    fn client_message(&self) -> String {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "Cart is empty".to_string(),
                CheckoutError::InsufficientStock { product, .. } => {
                    format!("Insufficient stock for {product}")
                }
                CheckoutError::ProductUnavailable(_) => {
                    "A product in your cart is no longer available".to_string()
                }
                CheckoutError::InvalidShippingAddress(field) => {
                    format!("Shipping address {field} is required")
                }
                CheckoutError::OrderNotFound(_) => "Order not found".to_string(),
                CheckoutError::AlreadyPaid(_) => "Order is already paid".to_string(),
                CheckoutError::PaymentVerification(_) => {
                    "Payment verification failed".to_string()
                }
                CheckoutError::GatewayRejected(_) => "Payment was not accepted".to_string(),
                CheckoutError::GatewayUnavailable(_) => {
                    "Payment service unavailable, please try again".to_string()
                }
                CheckoutError::InvalidAmount(_) | CheckoutError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound(_) => "Product not found".to_string(),
                CartError::CartNotFound => "Cart not found".to_string(),
                CartError::ItemNotFound(_) => "Item not found in cart".to_string(),
                other => other.to_string(),
            },
            Self::Order(err) => match err {
                OrderError::NotFound(_) => "Order not found".to_string(),
                OrderError::Forbidden(_) => "Not authorized to view this order".to_string(),
                OrderError::InvalidTransition { from, to } => {
                    format!("Cannot change order status from {from} to {to}")
                }
                OrderError::Conflict(_) => {
                    "Order was updated concurrently, please retry".to_string()
                }
                OrderError::Repository(_) => "Internal server error".to_string(),
            },
            Self::User(err) => match err {
                UserError::NotFound(_) => "User not found".to_string(),
                UserError::OwnAccount(_) => "You cannot change your own status".to_string(),
                UserError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::MissingToken => "Not authorized, no token".to_string(),
                AuthError::TokenExpired => "Token expired".to_string(),
                AuthError::InvalidToken | AuthError::UnknownUser => {
                    "Not authorized, token failed".to_string()
                }
                AuthError::Blocked => "Account is blocked".to_string(),
                AuthError::NotAdmin => "Admin access required".to_string(),
                AuthError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Signature(_) => "Invalid signature".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "message": self.client_message() }));
        (status, body).into_response()
    }
}

// Extractor rejections become 400s with the framework's own explanation.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use uuid::Uuid;
    use wear_with_pride_core::{OrderId, OrderStatus, ProductId, UserId};

    use super::*;

    async fn body_message(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json["message"].as_str().unwrap().to_string())
    }

    #[test]
    fn test_checkout_status_codes() {
        let order = OrderId::new(7);
        let cases = [
            (CheckoutError::EmptyCart, StatusCode::BAD_REQUEST),
            (
                CheckoutError::InsufficientStock {
                    product_id: ProductId::new(1),
                    product: "Pride Tee".to_string(),
                    requested: 3,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (CheckoutError::OrderNotFound(order), StatusCode::NOT_FOUND),
            (CheckoutError::AlreadyPaid(order), StatusCode::CONFLICT),
            (
                CheckoutError::PaymentVerification("declined".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::GatewayRejected("bad key".to_string()),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                CheckoutError::GatewayUnavailable("timeout".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CheckoutError::InvalidAmount(order),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_cart_order_and_auth_status_codes() {
        assert_eq!(
            AppError::from(CartError::InvalidQuantity).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CartError::ItemNotFound(Uuid::nil())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(OrderError::Forbidden(OrderId::new(1))).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Cancelled,
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::UnknownUser).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Blocked).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::NotAdmin).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(SignatureError::Mismatch).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::from(RepositoryError::DataCorruption(
            "orders.items is not an array".to_string(),
        ));
        let (status, message) = body_message(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");

        let err = AppError::from(CheckoutError::GatewayUnavailable(
            "connect to 10.0.0.3:443 refused".to_string(),
        ));
        let (status, message) = body_message(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!message.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_json_message_body() {
        let (status, message) = body_message(AppError::from(CheckoutError::EmptyCart)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Cart is empty");

        let (_, message) = body_message(AppError::from(CheckoutError::InsufficientStock {
            product_id: ProductId::new(1),
            product: "Rainbow Hoodie".to_string(),
            requested: 2,
            available: 0,
        }))
        .await;
        assert_eq!(message, "Insufficient stock for Rainbow Hoodie");
    }

    #[tokio::test]
    async fn test_user_management_errors() {
        let (status, message) = body_message(AppError::from(UserError::NotFound(UserId::new(9)))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "User not found");

        let (status, _) = body_message(AppError::from(UserError::OwnAccount(UserId::new(1)))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
