//! Cart display data for templates.
//!
//! Rows are derived from the stored cart on every change and rendered
//! declaratively: each row and each of its controls is keyed by the entry's
//! push key, so a re-render replaces rows instead of layering handlers.

use moon_bling_core::{Cart, FLAT_FEE, PushKey, StoredCartItem, format_price};

/// Image used when an entry has none (or it fails to load).
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";
/// Name shown for entries without one.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
/// Price shown for entries without one.
pub const MISSING_PRICE: &str = "N/A";
/// Shown instead of rows when the cart has no entries.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";
/// Shown instead of rows when the cart cannot be read.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading products. Please try again.";
/// Confirmation asked before deleting an entry.
pub const REMOVE_CONFIRMATION: &str = "Are you sure you want to remove this item?";

/// One cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRowView {
    /// Entry push key, used in control URLs.
    pub key: String,
    /// Element id: `cart-item-{key}`.
    pub dom_id: String,
    pub name: String,
    pub alt: String,
    pub price: String,
    pub image: String,
    pub quantity: u32,
    /// The "Qty: N" line is only shown for more than one unit.
    pub show_quantity: bool,
}

impl CartRowView {
    #[must_use]
    pub fn new(key: &PushKey, item: &StoredCartItem) -> Self {
        let name = item.name();
        let quantity = item.quantity().get();
        Self {
            key: key.to_string(),
            dom_id: format!("cart-item-{key}"),
            alt: name.clone().unwrap_or_else(|| "Product".to_string()),
            name: name.unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            price: item
                .price_text()
                .unwrap_or_else(|| MISSING_PRICE.to_string()),
            image: item
                .image()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            quantity,
            show_quantity: quantity > 1,
        }
    }

    /// Question asked before the delete control fires.
    #[must_use]
    pub const fn remove_confirmation(&self) -> &'static str {
        REMOVE_CONFIRMATION
    }
}

/// What the cart container shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartListView {
    Items(Vec<CartRowView>),
    Empty,
    Error,
}

/// Rendered totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsView {
    pub subtotal: String,
    /// Flat shipping fee.
    pub fee: String,
    pub total: String,
}

/// Cart container plus totals, as rendered on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub list: CartListView,
    /// Absent when the cart could not be read.
    pub totals: Option<TotalsView>,
}

impl CartView {
    /// Build the view for a cart.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        let totals = cart.totals();
        let list = if cart.is_empty() {
            CartListView::Empty
        } else {
            CartListView::Items(
                cart.iter()
                    .map(|(key, item)| CartRowView::new(key, item))
                    .collect(),
            )
        };

        Self {
            list,
            totals: Some(TotalsView {
                subtotal: totals.subtotal_display(),
                fee: format_price(FLAT_FEE),
                total: totals.total_display(),
            }),
        }
    }

    /// The view after a failed read.
    #[must_use]
    pub const fn load_error() -> Self {
        Self {
            list: CartListView::Error,
            totals: None,
        }
    }

    /// Rows to render (none for an empty or failed cart).
    #[must_use]
    pub fn rows(&self) -> &[CartRowView] {
        match &self.list {
            CartListView::Items(rows) => rows,
            CartListView::Empty | CartListView::Error => &[],
        }
    }

    /// Text shown instead of rows, if any.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match &self.list {
            CartListView::Items(_) => None,
            CartListView::Empty => Some(EMPTY_CART_MESSAGE),
            CartListView::Error => Some(LOAD_ERROR_MESSAGE),
        }
    }
}

/// Text of the cart badge: the number of entries, not units.
#[must_use]
pub fn cart_count_label(entries: usize) -> String {
    format!("🛒 Cart ({entries})")
}
