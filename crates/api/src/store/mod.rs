//! Storage seams.
//!
//! Handlers and services talk to persistence through these traits so the
//! checkout flow can be exercised without `PostgreSQL`. [`crate::db::PgStore`]
//! is the production implementation.

#[cfg(any(test, feature = "test-utils"))]
mod memory;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wear_with_pride_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{Cart, NewOrder, Order, OrderFilter, Product, User, UserFilter};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// One page of users matching `filter`, newest first, with the total
    /// match count.
    async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), RepositoryError>;

    /// Flip active/blocked atomically. `None` when the user does not exist.
    async fn toggle_user_status(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products for `ids`; unknown ids are silently absent from the result.
    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError>;

    /// Returns `false` when the user had no cart.
    async fn delete_cart(&self, user_id: UserId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One page of matching orders, newest first, and the total match count.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<Order>, u64), RepositoryError>;

    /// Atomically set the order paid if it is not already.
    ///
    /// Returns the updated order only to the caller that performed the
    /// transition; `None` means missing or already paid.
    async fn mark_paid(
        &self,
        id: OrderId,
        reference: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Decrement stock for a paid order's lines and delete the owner's cart,
    /// atomically and at most once per order.
    ///
    /// Returns `true` only to the caller that committed. On error nothing is
    /// applied, so the order still awaits its commit.
    async fn commit_stock(&self, id: OrderId) -> Result<bool, RepositoryError>;

    async fn orders_awaiting_stock_commit(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Compare-and-set on `order_status`, stamping the matching timestamp.
    ///
    /// Returns `None` when the order is missing or not in `from`.
    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
