//! Checkout flow: turn the signed-in user's cart into a pending order.
//!
//! The order record and the cart deletion are written in one multi-path
//! update, so either both land or neither does.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use moon_bling_core::{Cart, Order, PushKey, Shipping};

use super::cart::CartService;
use crate::firebase::{DatabaseError, DbPath, RealtimeDatabase, generate_push_key};
use crate::models::CurrentUser;

/// Shown after an order is stored.
pub const ORDER_PLACED_MESSAGE: &str =
    "Order Placed Successfully! Thank you for shopping with Moon Bling.";

/// Reasons an order was not placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// One or more shipping fields are blank.
    #[error("missing shipping fields: {}", .0.join(", "))]
    MissingShipping(Vec<&'static str>),

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Reading the cart or writing the order failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl CheckoutError {
    /// Message shown to the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::MissingShipping(_) => "Please fill in all shipping details.",
            Self::EmptyCart => "Your cart is empty!",
            Self::Database(_) => "Failed to place order. Please try again.",
        }
    }

    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Places orders.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<dyn RealtimeDatabase>,
    carts: CartService,
}

impl CheckoutService {
    #[must_use]
    pub fn new(db: Arc<dyn RealtimeDatabase>, carts: CartService) -> Self {
        Self { db, carts }
    }

    /// Store a pending order built from the user's current cart, then
    /// empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingShipping` or `CheckoutError::EmptyCart`
    /// without touching the database beyond the cart read, and
    /// `CheckoutError::Database` if the read or the combined write fails.
    #[instrument(skip(self, shipping), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        shipping: Shipping,
    ) -> Result<PushKey, CheckoutError> {
        let blank = shipping.blank_fields();
        if !blank.is_empty() {
            return Err(CheckoutError::MissingShipping(blank));
        }

        let items = self.carts.snapshot(&user.id).await?;
        if Cart::from_value(&items).is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = Order::pending(
            user.id.clone(),
            user.email.clone(),
            shipping,
            items,
            Utc::now(),
        );
        let key = generate_push_key();

        self.db
            .update_many(vec![
                (DbPath::order(&key), serde_json::to_value(&order).map_err(DatabaseError::from)?),
                (DbPath::cart(&user.id), Value::Null),
            ])
            .await?;

        tracing::info!(order_key = %key, total = %order.total, "Order placed");
        Ok(key)
    }
}
