//! Order repository for database operations.
//!
//! Payment confirmation is split into two guarded writes so that concurrent
//! confirmations (webhook racing client verification) cannot double-apply:
//!
//! 1. [`OrderRepository::mark_paid`] flips `payment_status` only while it is
//!    not yet `paid`; exactly one caller gets the row back.
//! 2. [`OrderRepository::commit_stock`] claims `stock_committed_at`,
//!    decrements stock and deletes the owner's cart in one transaction;
//!    exactly one caller commits, and a failure leaves all three for a retry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use wear_with_pride_core::{
    OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderFilter, OrderItem, ShippingAddress};

const ORDER_COLUMNS: &str = r"
    id, user_id, items, shipping_address, total_amount, payment_method,
    payment_status, order_status, payment_reference, paid_at,
    stock_committed_at, shipped_at, delivered_at, cancelled_at,
    created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items: Json<Vec<OrderItem>>,
    shipping_address: Json<ShippingAddress>,
    total_amount: Decimal,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    payment_reference: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    stock_committed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: OrderId::new(r.id),
            user_id: UserId::new(r.user_id),
            items: r.items.0,
            shipping_address: r.shipping_address.0,
            total_amount: r.total_amount,
            payment_method: r.payment_method,
            payment_status: r.payment_status,
            order_status: r.order_status,
            payment_reference: r.payment_reference,
            paid_at: r.paid_at,
            stock_committed_at: r.stock_committed_at,
            shipped_at: r.shipped_at,
            delivered_at: r.delivered_at,
            cancelled_at: r.cancelled_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.orders
                (user_id, items, shipping_address, total_amount, payment_method, payment_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id.as_i32())
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.total_amount)
        .bind(order.payment_method)
        .bind(order.payment_status)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// All orders placed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// One page of orders matching `filter`, newest first, plus the total
    /// number of matching orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<(Vec<Order>, u64), RepositoryError> {
        const WHERE: &str = r"
            WHERE ($1::shop.payment_method IS NULL OR payment_method = $1)
              AND ($2::shop.payment_status IS NULL OR payment_status = $2)
              AND ($3::shop.order_status IS NULL OR order_status = $3)
        ";

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.orders
            {WHERE}
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(filter.payment_method)
        .bind(filter.payment_status)
        .bind(filter.order_status)
        .bind(i64::from(filter.limit))
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM shop.orders {WHERE}"))
                .bind(filter.payment_method)
                .bind(filter.payment_status)
                .bind(filter.order_status)
                .fetch_one(self.pool)
                .await?;

        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {total}")))?;

        Ok((rows.into_iter().map(Order::from).collect(), total))
    }

    /// Mark an order paid unless it already is.
    ///
    /// Returns the updated order when this call performed the transition and
    /// `None` when the order is missing or was already paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        reference: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.orders
            SET payment_status = 'paid',
                payment_reference = $2,
                paid_at = $3,
                updated_at = NOW()
            WHERE id = $1 AND payment_status <> 'paid'
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(reference)
        .bind(paid_at)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Decrement stock for every line of a paid order and delete the owner's
    /// cart, at most once per order.
    ///
    /// Returns `true` when this call committed, `false` when the order is not
    /// paid or was already committed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// committed in that case.
    pub async fn commit_stock(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<(i32, Json<Vec<OrderItem>>)> = sqlx::query_as(
            r"
            UPDATE shop.orders
            SET stock_committed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND payment_status = 'paid' AND stock_committed_at IS NULL
            RETURNING user_id, items
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_id, Json(items))) = claimed else {
            return Ok(false);
        };

        // Lock rows in product order so concurrent commits cannot deadlock.
        let mut quantities: BTreeMap<ProductId, i64> = BTreeMap::new();
        for item in &items {
            *quantities.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
        }

        for (product_id, quantity) in quantities {
            let quantity = i32::try_from(quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "order {id} quantity {quantity} out of range"
                ))
            })?;

            let remaining: Option<(i32,)> = sqlx::query_as(
                r"
                UPDATE shop.products
                SET stock = stock - $2, updated_at = NOW()
                WHERE id = $1
                RETURNING stock
                ",
            )
            .bind(product_id.as_i32())
            .bind(quantity)
            .fetch_optional(&mut *tx)
            .await?;

            match remaining {
                None => tracing::warn!(
                    order_id = %id,
                    product_id = %product_id,
                    "Product no longer exists; stock not decremented"
                ),
                Some((stock,)) if stock < 0 => tracing::warn!(
                    order_id = %id,
                    product_id = %product_id,
                    stock,
                    "Product oversold"
                ),
                Some(_) => {}
            }
        }

        let cleared = sqlx::query("DELETE FROM shop.carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        tracing::debug!(order_id = %id, user_id, cleared, "Stock committed and cart cleared");
        Ok(true)
    }

    /// Paid orders whose stock commit never ran.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_awaiting_stock_commit(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.orders
            WHERE payment_status = 'paid' AND stock_committed_at IS NULL
            ORDER BY id
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Move an order from `from` to `to`, stamping the matching timestamp.
    ///
    /// Returns `None` when the order is missing or no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.orders
            SET order_status = $3,
                shipped_at = CASE WHEN $3 = 'shipped'::shop.order_status
                                  THEN COALESCE(shipped_at, $4) ELSE shipped_at END,
                delivered_at = CASE WHEN $3 = 'delivered'::shop.order_status
                                    THEN COALESCE(delivered_at, $4) ELSE delivered_at END,
                cancelled_at = CASE WHEN $3 = 'cancelled'::shop.order_status
                                    THEN COALESCE(cancelled_at, $4) ELSE cancelled_at END,
                updated_at = $4
            WHERE id = $1 AND order_status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(from)
        .bind(to)
        .bind(at)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }
}
