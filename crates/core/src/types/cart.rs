//! Cart items and cart totals.
//!
//! Cart entries live under `carts/{user_id}/{push_key}` in the realtime
//! database. Writes go through [`CartItem`], which cannot hold a quantity
//! below one. Reads go through [`StoredCartItem`], which tolerates missing or
//! oddly typed fields because the remote tree is not schema-checked.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::PushKey;
use super::price::{FLAT_FEE, format_price, parse_price};

/// Errors constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one.
    #[error("quantity must be at least 1")]
    Zero,
}

/// Number of units of a cart entry. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit, the quantity of every newly added item.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] for zero.
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        NonZeroU32::new(value).map(Self).ok_or(QuantityError::Zero)
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit (saturating at `u32::MAX`).
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One fewer unit, never going below one.
    #[must_use]
    pub fn decrement(self) -> Self {
        Self::new(self.get().saturating_sub(1)).unwrap_or(Self::ONE)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cart entry as written by "add to cart".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product name as shown on the product card.
    pub name: String,
    /// Display price, currency-prefixed (e.g. `"Rs. 1,200"`).
    pub price: String,
    /// Product image URL.
    pub image: String,
    /// Units in the cart.
    pub quantity: Quantity,
}

impl CartItem {
    /// A freshly added item with quantity one.
    #[must_use]
    pub fn new(name: impl Into<String>, price: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            image: image.into(),
            quantity: Quantity::ONE,
        }
    }
}

/// A cart entry as read back from the database.
///
/// Every field is optional and loosely typed; unknown fields are preserved
/// so an order snapshot carries the entry exactly as stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredCartItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StoredCartItem {
    /// Product name, if the entry has a non-empty one.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        non_empty_text(self.name.as_ref())
    }

    /// Display price text, if present.
    #[must_use]
    pub fn price_text(&self) -> Option<String> {
        non_empty_text(self.price.as_ref())
    }

    /// Image URL, if present.
    #[must_use]
    pub fn image(&self) -> Option<String> {
        non_empty_text(self.image.as_ref())
    }

    /// Stored quantity; missing, zero, negative or non-numeric values count
    /// as one. Fractional values are rounded down, so the rows, the
    /// quantity controls and the totals all see the same whole count.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // filtered to >= 1 and finite
    pub fn quantity(&self) -> Quantity {
        let raw = match self.quantity.as_ref() {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f as u64)),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        raw.and_then(|n| u32::try_from(n).ok())
            .and_then(|n| Quantity::new(n).ok())
            .unwrap_or(Quantity::ONE)
    }

    /// Parsed unit price (zero when missing or malformed).
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.price_text().map_or(Decimal::ZERO, |text| parse_price(&text))
    }

    /// Unit price multiplied by quantity. A line too large to represent
    /// counts as zero, the same as an unreadable price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price()
            .checked_mul(Decimal::from(self.quantity().get()))
            .unwrap_or(Decimal::ZERO)
    }
}

impl From<CartItem> for StoredCartItem {
    fn from(item: CartItem) -> Self {
        Self {
            name: Some(Value::String(item.name)),
            price: Some(Value::String(item.price)),
            image: Some(Value::String(item.image)),
            quantity: Some(Value::from(item.quantity.get())),
            extra: serde_json::Map::new(),
        }
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A user's cart: entries keyed by push key, in key (insertion) order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: BTreeMap<PushKey, StoredCartItem>,
}

impl Cart {
    /// Build a cart from the raw value stored at `carts/{user_id}`.
    ///
    /// `null` (no cart) is an empty cart. Children whose key is not a valid
    /// path segment or whose value is not an object are skipped.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(children) = value else {
            return Self::default();
        };

        let entries = children
            .iter()
            .filter_map(|(key, child)| {
                let key = PushKey::parse(key).ok()?;
                let item = serde_json::from_value::<StoredCartItem>(child.clone()).ok()?;
                Some((key, item))
            })
            .collect();

        Self { entries }
    }

    /// Number of entries (not the sum of quantities).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by key.
    #[must_use]
    pub fn get(&self, key: &PushKey) -> Option<&StoredCartItem> {
        self.entries.get(key)
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PushKey, &StoredCartItem)> {
        self.entries.iter()
    }

    /// Add an entry (used by tests and in-memory fixtures).
    pub fn insert(&mut self, key: PushKey, item: StoredCartItem) {
        self.entries.insert(key, item);
    }

    /// Subtotal and total for the current entries. The sum saturates at
    /// [`Decimal::MAX`].
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let subtotal = self
            .entries
            .values()
            .map(StoredCartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add);
        CartTotals::from_subtotal(subtotal)
    }
}

/// Money summary of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Subtotal plus the flat fee.
    pub total: Decimal,
}

impl CartTotals {
    /// Totals for a given subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        Self {
            subtotal,
            total: subtotal.saturating_add(FLAT_FEE),
        }
    }

    /// Subtotal as a display price.
    #[must_use]
    pub fn subtotal_display(&self) -> String {
        format_price(self.subtotal)
    }

    /// Total as a display price.
    #[must_use]
    pub fn total_display(&self) -> String {
        format_price(self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn key(s: &str) -> PushKey {
        PushKey::parse(s).unwrap()
    }

    #[test]
    fn test_quantity_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_decrement_is_floored_at_one() {
        for start in [1, 2, 5, 100] {
            let mut q = Quantity::new(start).unwrap();
            for _ in 0..(start + 10) {
                q = q.decrement();
                assert!(q.get() >= 1);
            }
            assert_eq!(q, Quantity::ONE);
        }
    }

    #[test]
    fn test_increment() {
        assert_eq!(Quantity::ONE.increment().get(), 2);
        let max = Quantity::new(u32::MAX).unwrap();
        assert_eq!(max.increment(), max);
    }

    #[test]
    fn test_quantity_deserialize_rejects_zero() {
        assert!(serde_json::from_value::<Quantity>(json!(0)).is_err());
        assert_eq!(
            serde_json::from_value::<Quantity>(json!(4)).unwrap().get(),
            4
        );
    }

    #[test]
    fn test_new_cart_item_has_quantity_one() {
        let item = CartItem::new("Moon Ring", "Rs. 1,200", "https://img/ring.jpg");
        assert_eq!(item.quantity, Quantity::ONE);
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "name": "Moon Ring",
                "price": "Rs. 1,200",
                "image": "https://img/ring.jpg",
                "quantity": 1
            })
        );
    }

    #[test]
    fn test_stored_item_tolerates_missing_fields() {
        let item: StoredCartItem = serde_json::from_value(json!({})).unwrap();
        assert_eq!(item.name(), None);
        assert_eq!(item.price_text(), None);
        assert_eq!(item.quantity(), Quantity::ONE);
        assert_eq!(item.line_total(), Decimal::ZERO);
    }

    #[test]
    fn test_stored_item_odd_quantities_count_as_one() {
        for raw in [json!(0), json!(-3), json!("lots"), json!(null), json!(0.5)] {
            let item: StoredCartItem = serde_json::from_value(json!({ "quantity": raw })).unwrap();
            assert_eq!(item.quantity(), Quantity::ONE, "{raw}");
        }
        let item: StoredCartItem = serde_json::from_value(json!({ "quantity": "3" })).unwrap();
        assert_eq!(item.quantity().get(), 3);
    }

    #[test]
    fn test_stored_item_preserves_unknown_fields() {
        let raw = json!({ "name": "Ring", "price": "Rs. 10", "quantity": 1, "color": "gold" });
        let item: StoredCartItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn test_cart_from_null_is_empty() {
        let cart = Cart::from_value(&Value::Null);
        assert!(cart.is_empty());
        assert_eq!(cart.totals().total, Decimal::from(150));
    }

    #[test]
    fn test_cart_scenario_two_units_of_1200() {
        let cart = Cart::from_value(&json!({
            "-Nabc": { "name": "Ring", "price": "Rs. 1,200", "image": "x", "quantity": 2 }
        }));
        let totals = cart.totals();
        assert_eq!(totals.subtotal, Decimal::from(2400));
        assert_eq!(totals.subtotal_display(), "Rs. 2,400");
        assert_eq!(totals.total_display(), "Rs. 2,550");
    }

    #[test]
    fn test_cart_counts_entries_not_units() {
        let cart = Cart::from_value(&json!({
            "-Na": { "name": "A", "price": "Rs. 100", "quantity": 5 },
            "-Nb": { "name": "B", "price": "Rs. 200", "quantity": 1 }
        }));
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.totals().subtotal, Decimal::from(700));
    }

    #[test]
    fn test_cart_iterates_in_key_order() {
        let cart = Cart::from_value(&json!({
            "-Nb": { "name": "second" },
            "-Na": { "name": "first" }
        }));
        let names: Vec<_> = cart.iter().filter_map(|(_, item)| item.name()).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(cart.get(&key("-Na")).is_some());
    }

    #[test]
    fn test_cart_skips_malformed_children() {
        let cart = Cart::from_value(&json!({
            "-Na": { "name": "ok" },
            "-Nb": "not an object",
            "bad.key": { "name": "skipped" }
        }));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_oversized_prices_never_overflow() {
        let max = "Rs. 79,228,162,514,264,337,593,543,950,335";
        let huge = format!("Rs. 5{}", "0".repeat(28));

        let at_max = Cart::from_value(&json!({ "-Na": { "price": max, "quantity": 1 } }));
        assert_eq!(at_max.totals().subtotal, Decimal::MAX);
        assert_eq!(at_max.totals().total, Decimal::MAX);

        let doubled = Cart::from_value(&json!({ "-Na": { "price": huge, "quantity": 2 } }));
        assert_eq!(doubled.totals().subtotal, Decimal::ZERO);

        let summed = Cart::from_value(&json!({
            "-Na": { "price": max, "quantity": 1 },
            "-Nb": { "price": max, "quantity": 1 },
            "-Nc": { "price": "Rs. 100", "quantity": 1 }
        }));
        assert_eq!(summed.totals().subtotal, Decimal::MAX);
        assert!(summed.totals().total_display().starts_with("Rs. 79,228,162,514"));
    }

    #[test]
    fn test_fractional_quantity_rounds_down() {
        let item: StoredCartItem =
            serde_json::from_value(json!({ "price": "Rs. 100", "quantity": 2.7 })).unwrap();
        assert_eq!(item.quantity().get(), 2);
        assert_eq!(item.line_total(), Decimal::from(200));
    }

    #[test]
    fn test_total_is_subtotal_plus_fee() {
        for subtotal in [0, 1, 150, 2400, 999_999] {
            let totals = CartTotals::from_subtotal(Decimal::from(subtotal));
            assert_eq!(totals.total - totals.subtotal, FLAT_FEE);
        }
    }
}
