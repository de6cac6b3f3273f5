//! Operator order and user management.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use wear_with_pride_core::{
    OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId, UserRole, UserStatus,
};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{OrderFilter, User, UserFilter};
use crate::routes::orders::OrderView;
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::services::orders::OrderService;
use crate::services::users::UserService;
use crate::state::AppState;

/// Listing query. Blank filter values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub order_status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Parse an optional, possibly blank filter value.
fn parse_filter<T>(name: &str, raw: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| AppError::BadRequest(format!("Invalid {name}: {e}")))
        })
        .transpose()
}

impl OrderListQuery {
    fn into_filter(self) -> Result<OrderFilter> {
        Ok(OrderFilter {
            payment_method: parse_filter::<PaymentMethod>(
                "paymentMethod",
                self.payment_method.as_deref(),
            )?,
            payment_status: parse_filter::<PaymentStatus>(
                "paymentStatus",
                self.payment_status.as_deref(),
            )?,
            order_status: parse_filter::<OrderStatus>("orderStatus", self.order_status.as_deref())?,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(OrderFilter::DEFAULT_LIMIT),
        }
        .normalized())
    }
}

/// One page of orders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub page: u32,
    pub limit: u32,
    pub total_orders: u64,
    pub total_pages: u64,
    pub orders: Vec<OrderView>,
}

/// Filtered, paginated listing, newest first.
#[instrument(skip(state, admin, query), fields(admin_id = %admin.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<Json<OrderListResponse>> {
    let page = OrderService::new(state.store())
        .list(query.into_filter()?)
        .await?;

    Ok(Json(OrderListResponse {
        page: page.page,
        limit: page.limit,
        total_orders: page.total,
        total_pages: page.total_pages(),
        orders: page.orders.into_iter().map(OrderView::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub message: &'static str,
    pub order: OrderView,
}

/// Move an order through fulfillment.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, order_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<StatusUpdated>> {
    let next: OrderStatus = body
        .status
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order status".to_string()))?;

    let order = OrderService::new(state.store())
        .update_status(id, next)
        .await?;

    tracing::info!(status = %next, "Order status updated");

    Ok(Json(StatusUpdated {
        message: "Order status updated",
        order: order.into(),
    }))
}

/// User listing query. Blank filter values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserListQuery {
    fn into_filter(self) -> Result<UserFilter> {
        Ok(UserFilter {
            role: parse_filter::<UserRole>("role", self.role.as_deref())?,
            status: parse_filter::<UserStatus>("status", self.status.as_deref())?,
            search: self.search,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(UserFilter::DEFAULT_LIMIT),
        }
        .normalized())
    }
}

/// One page of users.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub page: u32,
    pub limit: u32,
    pub total_users: u64,
    pub total_pages: u64,
    pub users: Vec<User>,
}

/// Filtered, searchable user listing, newest first.
#[instrument(skip(state, admin, query), fields(admin_id = %admin.id))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<UserListResponse>> {
    let page = UserService::new(state.store())
        .list(query.into_filter()?)
        .await?;

    Ok(Json(UserListResponse {
        page: page.page,
        limit: page.limit,
        total_users: page.total,
        total_pages: page.total_pages(),
        users: page.users,
    }))
}

#[derive(Debug, Serialize)]
pub struct UserStatusToggled {
    pub message: &'static str,
    pub status: UserStatus,
}

/// Block an active user or reactivate a blocked one.
#[instrument(skip(state, admin), fields(admin_id = %admin.id, user_id = %id))]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserStatusToggled>> {
    let user = UserService::new(state.store())
        .toggle_status(admin.id, id)
        .await?;

    Ok(Json(UserStatusToggled {
        message: "User status updated",
        status: user.status,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_and_blank_filters() {
        let query = OrderListQuery {
            payment_method: Some(String::new()),
            payment_status: Some("  ".to_string()),
            ..OrderListQuery::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.payment_method, None);
        assert_eq!(filter.payment_status, None);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, OrderFilter::DEFAULT_LIMIT);
    }

    #[test]
    fn test_query_parses_filters_and_caps_limit() {
        let query = OrderListQuery {
            payment_method: Some("Pay on Delivery".to_string()),
            payment_status: Some("Not Paid".to_string()),
            order_status: Some("shipped".to_string()),
            page: Some(3),
            limit: Some(1000),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.payment_method, Some(PaymentMethod::PayOnDelivery));
        assert_eq!(filter.payment_status, Some(PaymentStatus::NotPaid));
        assert_eq!(filter.order_status, Some(OrderStatus::Shipped));
        assert_eq!(filter.page, 3);
        assert_eq!(filter.limit, OrderFilter::MAX_LIMIT);
    }

    #[test]
    fn test_query_rejects_unknown_status() {
        let query = OrderListQuery {
            order_status: Some("lost".to_string()),
            ..OrderListQuery::default()
        };
        assert!(matches!(
            query.into_filter().unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_user_query_parses_role_status_and_search() {
        let query = UserListQuery {
            role: Some("admin".to_string()),
            status: Some("Blocked".to_string()),
            search: Some(" ada ".to_string()),
            page: None,
            limit: Some(0),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.role, Some(UserRole::Admin));
        assert_eq!(filter.status, Some(UserStatus::Blocked));
        assert_eq!(filter.search.as_deref(), Some("ada"));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, UserFilter::DEFAULT_LIMIT);

        let query = UserListQuery {
            role: Some("owner".to_string()),
            ..UserListQuery::default()
        };
        assert!(matches!(
            query.into_filter().unwrap_err(),
            AppError::BadRequest(_)
        ));
    }
}
