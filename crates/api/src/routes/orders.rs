//! Order history route handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use wear_with_pride_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderItem, ShippingAddress};
use crate::routes::ApiPath;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Order as returned to customers and operators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub order_status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            is_paid: order.is_paid(),
            payment_status: order.display_payment_status(),
            order_items: order.items,
            shipping_address: order.shipping_address,
            total_price: order.total_amount,
            payment_method: order.payment_method,
            paid_at: order.paid_at,
            payment_reference: order.payment_reference,
            order_status: order.order_status,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
            cancelled_at: order.cancelled_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// The caller's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderService::new(state.store()).for_user(user.id).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// One order owned by the caller.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    let order = OrderService::new(state.store())
        .get_owned(user.id, id)
        .await?;
    Ok(Json(order.into()))
}
