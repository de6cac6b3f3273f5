//! Core types for Wear With Pride.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, to_minor_units};
pub use status::*;
