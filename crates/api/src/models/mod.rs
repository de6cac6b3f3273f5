//! Domain models for the shop backend.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, NewCartLine};
pub use order::{NewOrder, Order, OrderFilter, OrderItem, ShippingAddress};
pub use product::Product;
pub use user::{User, UserFilter};
