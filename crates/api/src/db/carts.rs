//! Cart repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use wear_with_pride_core::UserId;

use super::RepositoryError;
use crate::models::{Cart, CartItem};

#[derive(sqlx::FromRow)]
struct CartRow {
    user_id: i32,
    items: Json<Vec<CartItem>>,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the cart owned by `user_id`, if one exists.
    ///
    /// The stored total is ignored; it is recomputed from the items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or the items
    /// column does not decode.
    pub async fn get_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT user_id, items
            FROM shop.carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Cart::from_items(UserId::new(r.user_id), r.items.0)))
    }

    /// Insert or replace the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let total: Decimal = cart.total_price();
        sqlx::query(
            r"
            INSERT INTO shop.carts (user_id, items, total_price)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET items = EXCLUDED.items,
                total_price = EXCLUDED.total_price,
                updated_at = NOW()
            ",
        )
        .bind(cart.user_id().as_i32())
        .bind(Json(cart.items()))
        .bind(total)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the user's cart. Returns `false` when there was none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.carts WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
