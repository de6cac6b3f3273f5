//! Wear With Pride Core - Shared domain types.
//!
//! This crate provides the types shared by every Wear With Pride component:
//! - `api` - HTTP backend (cart, checkout, payments, orders)
//! - `cli` - Migrations and operator tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money helpers, emails, and order/payment statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
