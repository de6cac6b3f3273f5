//! Wear With Pride API library.
//!
//! Cart, checkout, Paystack payment reconciliation, and order management for
//! the Wear With Pride store. The binary in `main.rs` wires this library to
//! `PostgreSQL` and the live Paystack API; tests wire it to in-memory doubles.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
