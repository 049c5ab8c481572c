//! Core types for Moon Bling.
//!
//! This module provides type-safe wrappers for the storefront's domain
//! concepts and the records persisted in the realtime database.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use cart::{Cart, CartItem, CartTotals, Quantity, QuantityError, StoredCartItem};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, Shipping};
pub use price::{CURRENCY_PREFIX, FLAT_FEE, format_price, parse_price};
pub use status::OrderStatus;
