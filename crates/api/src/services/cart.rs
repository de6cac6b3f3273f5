//! Cart operations.
//!
//! Prices are captured when a product is added: the sale price when one is
//! set and positive, the list price otherwise. Later catalog changes never
//! reprice an existing line.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use wear_with_pride_core::{ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{Cart, NewCartLine, Product};
use crate::store::Store;

/// Cart operation failures.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("cart not found")]
    CartNotFound,

    #[error("cart item {0} not found")]
    ItemNotFound(Uuid),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Add-to-cart request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub selected_image: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart, or an empty one if they have none yet.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the lookup fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, CartError> {
        Ok(self
            .store
            .cart(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id)))
    }

    /// Products referenced by the cart, for display.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the lookup fails.
    pub async fn products(&self, cart: &Cart) -> Result<Vec<Product>, CartError> {
        Ok(self.store.products(&cart.product_ids()).await?)
    }

    /// Add a product, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a zero quantity and `ProductNotFound`
    /// for an unknown product.
    #[tracing::instrument(skip(self, request), fields(user_id = %user_id, product_id = %request.product_id))]
    pub async fn add(&self, user_id: UserId, request: AddToCart) -> Result<Cart, CartError> {
        if request.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let product = self
            .store
            .product(request.product_id)
            .await?
            .ok_or(CartError::ProductNotFound(request.product_id))?;

        let mut cart = self.get(user_id).await?;
        cart.add(NewCartLine {
            product_id: product.id,
            quantity: request.quantity,
            unit_price: product.unit_price(),
            size: request.size,
            color: request.color,
            selected_image: request.selected_image,
        });
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Set the quantity of one line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity`, `CartNotFound`, or `ItemNotFound`.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: Uuid,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let mut cart = self
            .store
            .cart(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if !cart.set_quantity(item_id, quantity) {
            return Err(CartError::ItemNotFound(item_id));
        }
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `CartNotFound` or `ItemNotFound`.
    pub async fn remove(&self, user_id: UserId, item_id: Uuid) -> Result<Cart, CartError> {
        let mut cart = self
            .store
            .cart(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        cart.remove(item_id)
            .ok_or(CartError::ItemNotFound(item_id))?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Delete the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        self.store.delete_cart(user_id).await?;
        Ok(())
    }
}
