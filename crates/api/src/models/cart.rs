//! Shopping cart model.
//!
//! A cart belongs to exactly one user and is created lazily on first add.
//! `total_price` is never stored independently of the items: every mutation
//! goes through [`Cart`] methods that recompute it, and carts loaded from the
//! database are rebuilt through [`Cart::from_items`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wear_with_pride_core::{ProductId, UserId};

/// One line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the product was added.
    pub price_at_time: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_image: Option<String>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price_at_time * Decimal::from(self.quantity)
    }

    fn same_variant(&self, line: &NewCartLine) -> bool {
        self.product_id == line.product_id
            && self.size == line.size
            && self.color == line.color
            && self.selected_image == line.selected_image
    }
}

/// A product to add to a cart, already priced.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub size: Option<String>,
    pub color: Option<String>,
    pub selected_image: Option<String>,
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    user_id: UserId,
    items: Vec<CartItem>,
    total_price: Decimal,
}

impl Cart {
    /// An empty cart for `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total_price: Decimal::ZERO,
        }
    }

    /// Rebuild a cart from stored items, recomputing the total.
    #[must_use]
    pub fn from_items(user_id: UserId, items: Vec<CartItem>) -> Self {
        let mut cart = Self {
            user_id,
            items,
            total_price: Decimal::ZERO,
        };
        cart.recompute_total();
        cart
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a line, merging into an existing line for the same product and
    /// variant (size, color, selected image).
    ///
    /// A merged line keeps its original captured price. Returns the id of the
    /// line that now holds the product.
    pub fn add(&mut self, line: NewCartLine) -> Uuid {
        let id = if let Some(existing) = self.items.iter_mut().find(|i| i.same_variant(&line)) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            existing.id
        } else {
            let id = Uuid::new_v4();
            self.items.push(CartItem {
                id,
                product_id: line.product_id,
                quantity: line.quantity,
                price_at_time: line.unit_price,
                size: line.size,
                color: line.color,
                selected_image: line.selected_image,
            });
            id
        };
        self.recompute_total();
        id
    }

    /// Set the quantity of a line. Returns `false` if no line has `item_id`.
    pub fn set_quantity(&mut self, item_id: Uuid, quantity: u32) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) else {
            return false;
        };
        item.quantity = quantity;
        self.recompute_total();
        true
    }

    /// Remove a line. Removing an unknown line is a no-op.
    pub fn remove(&mut self, item_id: Uuid) -> Option<CartItem> {
        let index = self.items.iter().position(|i| i.id == item_id)?;
        let removed = self.items.remove(index);
        self.recompute_total();
        Some(removed)
    }

    /// Total quantity requested per product, across all variants.
    #[must_use]
    pub fn requested_quantities(&self) -> BTreeMap<ProductId, u32> {
        let mut requested = BTreeMap::new();
        for item in &self.items {
            let qty = requested.entry(item.product_id).or_insert(0_u32);
            *qty = qty.saturating_add(item.quantity);
        }
        requested
    }

    /// Distinct product ids in cart order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }

    fn recompute_total(&mut self) {
        self.total_price = self.items.iter().map(CartItem::line_total).sum();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: i32, quantity: u32, price: i64, size: Option<&str>) -> NewCartLine {
        NewCartLine {
            product_id: ProductId::new(product),
            quantity,
            unit_price: Decimal::new(price, 0),
            size: size.map(String::from),
            color: None,
            selected_image: None,
        }
    }

    #[test]
    fn test_add_merges_same_variant() {
        let mut cart = Cart::new(UserId::new(1));
        let first = cart.add(line(10, 1, 2500, Some("M")));
        let second = cart.add(line(10, 2, 9999, Some("M")));

        assert_eq!(first, second);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        // Merged line keeps the price captured on first add.
        assert_eq!(cart.total_price(), Decimal::new(7500, 0));
    }

    #[test]
    fn test_add_keeps_variants_apart() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add(line(10, 1, 2500, Some("M")));
        cart.add(line(10, 1, 2500, Some("L")));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.requested_quantities()[&ProductId::new(10)], 2);
        assert_eq!(cart.product_ids(), vec![ProductId::new(10)]);
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = Cart::new(UserId::new(1));
        let a = cart.add(line(1, 2, 1000, None));
        let b = cart.add(line(2, 1, 500, None));
        assert_eq!(cart.total_price(), Decimal::new(2500, 0));

        assert!(cart.set_quantity(a, 5));
        assert_eq!(cart.total_price(), Decimal::new(5500, 0));

        assert!(cart.remove(b).is_some());
        assert_eq!(cart.total_price(), Decimal::new(5000, 0));

        assert!(!cart.set_quantity(Uuid::new_v4(), 1));
        assert!(cart.remove(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_from_items_recomputes_total() {
        let item = CartItem {
            id: Uuid::new_v4(),
            product_id: ProductId::new(3),
            quantity: 3,
            price_at_time: Decimal::new(1250, 2),
            size: None,
            color: None,
            selected_image: None,
        };
        let cart = Cart::from_items(UserId::new(9), vec![item]);
        assert_eq!(cart.total_price(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add(line(4, 1, 100, Some("S")));
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["totalPrice"], "100");
        assert_eq!(json["items"][0]["productId"], 4);
        assert_eq!(json["items"][0]["priceAtTime"], "100");
    }
}
