//! Catalog product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use wear_with_pride_core::ProductId;

/// A purchasable catalog item.
///
/// `stock` is signed: payments confirmed after the last unit sold may push it
/// below zero, and operators reconcile from there.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a customer pays right now: the sale price when one is set and
    /// positive, the list price otherwise.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale > Decimal::ZERO => sale,
            _ => self.price,
        }
    }

    /// Whether `quantity` units can be promised from current stock.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        i64::from(self.stock) >= i64::from(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, sale_price: Option<i64>, stock: i32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Ankara Shirt".to_string(),
            description: String::new(),
            category: "shirts".to_string(),
            price: Decimal::new(price, 0),
            sale_price: sale_price.map(|p| Decimal::new(p, 0)),
            stock,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_price_prefers_positive_sale_price() {
        assert_eq!(product(5000, Some(4000), 1).unit_price(), Decimal::new(4000, 0));
        assert_eq!(product(5000, Some(0), 1).unit_price(), Decimal::new(5000, 0));
        assert_eq!(product(5000, None, 1).unit_price(), Decimal::new(5000, 0));
    }

    #[test]
    fn test_has_stock_for() {
        let p = product(100, None, 3);
        assert!(p.has_stock_for(3));
        assert!(!p.has_stock_for(4));
        assert!(!product(100, None, -2).has_stock_for(1));
    }
}
