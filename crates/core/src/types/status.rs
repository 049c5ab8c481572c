//! Order status values.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status stored on an order record.
///
/// Orders are written once by the storefront with [`OrderStatus::Pending`];
/// any later transition belongs to whoever fulfils the order. The value is
/// persisted as its bare name (`"Pending"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl OrderStatus {
    /// Returns the persisted name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
