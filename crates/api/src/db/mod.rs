//! Database operations for the shop `PostgreSQL` database.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `users` - Shop accounts issued by the auth service; only `status` is written here
//! - `products` - Catalog with stock levels
//! - `carts` - One cart per user, items as JSONB
//! - `orders` - Placed orders, items and shipping address as JSONB
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p wear-with-pride-cli -- migrate
//! ```
//!
//! All queries are runtime-checked (`query_as` with binds) so the crate builds
//! without a live database.

pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use wear_with_pride_core::{OrderId, OrderStatus, ProductId, UserId};

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

use crate::models::{Cart, NewOrder, Order, OrderFilter, Product, User, UserFilter};
use crate::store::{CartStore, CatalogStore, OrderStore, Store, UserStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// PgStore
// =============================================================================

/// [`Store`] backed by `PostgreSQL`.
///
/// Thin adapter over the per-table repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), RepositoryError> {
        UserRepository::new(&self.pool).list(filter).await
    }

    async fn toggle_user_status(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).toggle_status(id).await
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_many(ids).await
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool).get_for_user(user_id).await
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).upsert(cart).await
    }

    async fn delete_cart(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        CartRepository::new(&self.pool).delete_for_user(user_id).await
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).create(&order).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list_for_user(user_id).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<Order>, u64), RepositoryError> {
        OrderRepository::new(&self.pool).list(filter).await
    }

    async fn mark_paid(
        &self,
        id: OrderId,
        reference: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .mark_paid(id, reference, paid_at)
            .await
    }

    async fn commit_stock(&self, id: OrderId) -> Result<bool, RepositoryError> {
        OrderRepository::new(&self.pool).commit_stock(id).await
    }

    async fn orders_awaiting_stock_commit(&self) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .list_awaiting_stock_commit()
            .await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .update_status(id, from, to, at)
            .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
