//! Cart manager: a user's cart in the realtime database.
//!
//! Entries live under `carts/{user_id}` keyed by push key. Adding appends a
//! new entry with quantity one; quantity changes read the stored entry and
//! write back only the `quantity` field.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use moon_bling_core::{Cart, CartItem, PushKey, Quantity, StoredCartItem, UserId};

use crate::firebase::{DatabaseError, DbPath, RealtimeDatabase};

/// Direction of a quantity control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityOp {
    Increment,
    Decrement,
}

impl QuantityOp {
    /// Apply to a quantity (decrement is floored at one).
    #[must_use]
    pub fn apply(self, quantity: Quantity) -> Quantity {
        match self {
            Self::Increment => quantity.increment(),
            Self::Decrement => quantity.decrement(),
        }
    }
}

/// Cart operations for signed-in users.
#[derive(Clone)]
pub struct CartService {
    db: Arc<dyn RealtimeDatabase>,
}

impl CartService {
    #[must_use]
    pub fn new(db: Arc<dyn RealtimeDatabase>) -> Self {
        Self { db }
    }

    /// Append an item to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the write fails; nothing is retried.
    #[instrument(skip(self, item), fields(product = %item.name))]
    pub async fn add_item(&self, user: &UserId, item: CartItem) -> Result<PushKey, DatabaseError> {
        let value = serde_json::to_value(&item)?;
        let key = self.db.push(&DbPath::cart(user), value).await?;
        tracing::info!(key = %key, "Added item to cart");
        Ok(key)
    }

    /// Read the user's cart once.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the read fails.
    pub async fn load(&self, user: &UserId) -> Result<Cart, DatabaseError> {
        let value = self.snapshot(user).await?;
        Ok(Cart::from_value(&value))
    }

    /// The cart tree exactly as stored (`null` when there is none).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the read fails.
    pub async fn snapshot(&self, user: &UserId) -> Result<Value, DatabaseError> {
        self.db.get(&DbPath::cart(user)).await
    }

    /// Change an entry's quantity by one, based on the stored value.
    ///
    /// Returns the new quantity, or `None` if the entry no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the read or write fails.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        user: &UserId,
        key: &PushKey,
        op: QuantityOp,
    ) -> Result<Option<Quantity>, DatabaseError> {
        let path = DbPath::cart_item(user, key);
        let stored = self.db.get(&path).await?;
        if !stored.is_object() {
            tracing::warn!(key = %key, "Quantity change for missing cart entry");
            return Ok(None);
        }

        let item: StoredCartItem = serde_json::from_value(stored)?;
        let quantity = op.apply(item.quantity());

        let mut fields = Map::new();
        fields.insert("quantity".to_string(), Value::from(quantity.get()));
        self.db.update(&path, fields).await?;

        Ok(Some(quantity))
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: &UserId, key: &PushKey) -> Result<(), DatabaseError> {
        self.db.remove(&DbPath::cart_item(user, key)).await
    }

    /// Follow the user's cart: the current contents, then the contents
    /// after every change.
    pub fn watch(&self, user: &UserId) -> impl Stream<Item = Result<Cart, DatabaseError>> + use<> {
        self.db
            .subscribe(&DbPath::cart(user))
            .map(|value| value.map(|value| Cart::from_value(&value)))
    }
}
