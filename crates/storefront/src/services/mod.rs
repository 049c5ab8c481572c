//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart manager (add, quantity changes, removal, live watch)
//! - `checkout` - Order placement from the current cart

pub mod cart;
pub mod checkout;

pub use cart::{CartService, QuantityOp};
pub use checkout::{CheckoutError, CheckoutService, ORDER_PLACED_MESSAGE};
