//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (store ping)
//!
//! # Cart (auth)
//! GET    /api/cart                        - Current cart
//! POST   /api/cart/add                    - Add a product
//! PUT    /api/cart/item/{item_id}         - Set line quantity
//! DELETE /api/cart/item/{item_id}         - Remove a line
//! DELETE /api/cart/clear                  - Delete the cart
//!
//! # Checkout (auth)
//! POST   /api/checkout                    - Cart to unpaid order
//! POST   /api/checkout/initialize         - Open a Paystack transaction
//! POST   /api/checkout/verify             - Confirm a completed payment
//!
//! # Paystack webhook (signature, no auth, no rate limit)
//! POST   /api/checkout/webhook
//! POST   /api/checkout/paystack/webhook
//!
//! # Orders (auth)
//! GET    /api/orders/my-orders            - Own orders, newest first
//! GET    /api/orders/{id}                 - One own order
//!
//! # Admin (admin role)
//! GET    /api/admin/orders                - Filtered, paginated listing
//! PATCH  /api/admin/orders/{id}/status    - Fulfillment status change
//! GET    /api/admin/users                 - Filtered, searchable user listing
//! PATCH  /api/admin/users/{id}/status     - Toggle active/blocked
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod webhook;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, patch, post, put},
};

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// JSON body extractor whose rejections are `400 {"message"}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections are `400 {"message"}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query extractor whose rejections are `400 {"message"}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/item/{item_id}", put(cart::update).delete(cart::remove))
        .route("/clear", delete(cart::clear))
        .layer(api_rate_limiter())
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create))
        .route("/initialize", post(checkout::initialize))
        .route("/verify", post(checkout::verify))
        .layer(checkout_rate_limiter())
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::paystack))
        .route("/paystack/webhook", post(webhook::paystack))
}

/// Create the order history routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/my-orders", get(orders::mine))
        .route("/{id}", get(orders::show))
        .layer(api_rate_limiter())
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", patch(admin::update_status))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/status", patch(admin::toggle_user_status))
        .layer(api_rate_limiter())
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/api/checkout", checkout_routes().merge(webhook_routes()))
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}
