//! Order history and operator order management.

use chrono::Utc;
use thiserror::Error;

use wear_with_pride_core::{OrderId, OrderStatus, UserId};

use crate::db::RepositoryError;
use crate::models::{Order, OrderFilter};
use crate::store::Store;

/// Order lookup and update failures.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The order exists but belongs to another user.
    #[error("not authorized to view order {0}")]
    Forbidden(OrderId),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order changed between read and write.
    #[error("order {0} was modified concurrently")]
    Conflict(OrderId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One page of an operator listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl OrderPage {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// One order, visible only to its owner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden`.
    pub async fn get_owned(&self, user_id: UserId, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        if order.user_id != user_id {
            return Err(OrderError::Forbidden(order_id));
        }
        Ok(order)
    }

    /// Operator listing with filters and paging.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn list(&self, filter: OrderFilter) -> Result<OrderPage, OrderError> {
        let filter = filter.normalized();
        let (orders, total) = self.store.list_orders(&filter).await?;
        Ok(OrderPage {
            orders,
            page: filter.page,
            limit: filter.limit,
            total,
        })
    }

    /// Move an order through fulfillment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` when the move is not allowed
    /// from the current status, or `Conflict` when another update won.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, to = %next))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        let current = order.order_status;
        if !current.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let updated = self
            .store
            .update_order_status(order_id, current, next, Utc::now())
            .await?
            .ok_or(OrderError::Conflict(order_id))?;

        tracing::info!(from = %current, "Order status updated");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use wear_with_pride_core::{PaymentMethod, PaymentStatus, ProductId, UserRole};

    use super::*;
    use crate::models::{NewOrder, OrderItem, ShippingAddress};
    use crate::store::{MemoryStore, OrderStore};

    async fn place(store: &MemoryStore, user: i32, method: PaymentMethod) -> Order {
        store
            .create_order(NewOrder::new(
                UserId::new(user),
                vec![OrderItem {
                    product_id: ProductId::new(1),
                    name: "Aso Oke".to_string(),
                    price: Decimal::new(15000, 0),
                    quantity: 1,
                    size: None,
                    color: None,
                    image: None,
                    selected_image: None,
                }],
                ShippingAddress::default(),
                method,
            ))
            .await
            .unwrap()
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(1, "a@shop.ng", UserRole::User).await;
        store.insert_user(2, "b@shop.ng", UserRole::User).await;
        store
    }

    #[tokio::test]
    async fn test_get_owned_checks_owner() {
        let store = store().await;
        let order = place(&store, 1, PaymentMethod::Paystack).await;
        let service = OrderService::new(&store);

        assert_eq!(
            service.get_owned(UserId::new(1), order.id).await.unwrap().id,
            order.id
        );
        assert!(matches!(
            service.get_owned(UserId::new(2), order.id).await.unwrap_err(),
            OrderError::Forbidden(_)
        ));
        assert!(matches!(
            service
                .get_owned(UserId::new(1), OrderId::new(999))
                .await
                .unwrap_err(),
            OrderError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_for_user_newest_first() {
        let store = store().await;
        let first = place(&store, 1, PaymentMethod::Paystack).await;
        let second = place(&store, 1, PaymentMethod::PayOnDelivery).await;
        place(&store, 2, PaymentMethod::Paystack).await;

        let orders = OrderService::new(&store)
            .for_user(UserId::new(1))
            .await
            .unwrap();

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let store = store().await;
        for _ in 0..3 {
            place(&store, 1, PaymentMethod::Paystack).await;
        }
        place(&store, 2, PaymentMethod::PayOnDelivery).await;
        let service = OrderService::new(&store);

        let page = service
            .list(OrderFilter {
                payment_status: Some(PaymentStatus::Pending),
                limit: 2,
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.orders.len(), 2);
        assert_eq!(page.total_pages(), 2);

        let page = service
            .list(OrderFilter {
                payment_method: Some(PaymentMethod::PayOnDelivery),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.limit, OrderFilter::DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn test_status_transitions_stamp_timestamps() {
        let store = store().await;
        let order = place(&store, 1, PaymentMethod::Paystack).await;
        let service = OrderService::new(&store);

        let shipped = service
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.order_status, OrderStatus::Shipped);
        assert!(shipped.shipped_at.is_some());

        let delivered = service
            .update_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.shipped_at, shipped.shipped_at);
    }

    #[tokio::test]
    async fn test_terminal_status_cannot_change() {
        let store = store().await;
        let order = place(&store, 1, PaymentMethod::Paystack).await;
        let service = OrderService::new(&store);
        service
            .update_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let err = service
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Shipped
            }
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_order() {
        let store = store().await;
        let err = OrderService::new(&store)
            .update_status(OrderId::new(5), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }
}
