//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Bearer token verification
//! - `cart` - Cart mutations with captured prices
//! - `checkout` - Cart to order, payment initialization and confirmation
//! - `email` - Order receipts over SMTP
//! - `orders` - Order history and operator status updates
//! - `payments` - Payment gateway seam
//! - `paystack` - Paystack client and webhook verification
//! - `users` - Operator user listing and blocking

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod orders;
pub mod payments;
pub mod paystack;
pub mod users;
