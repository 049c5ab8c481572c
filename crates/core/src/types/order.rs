//! Order records written at checkout.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cart::Cart;
use super::email::Email;
use super::id::UserId;
use super::status::OrderStatus;

/// Shipping details collected by the order form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipping {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl Shipping {
    /// Names of the fields that are blank after trimming, in form order.
    #[must_use]
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// An order as stored under `orders/{push_key}`.
///
/// `items` is the raw cart tree exactly as it was read at submission time,
/// and `total` is the display string the shopper saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub user_id: UserId,
    pub user_email: Email,
    pub shipping: Shipping,
    pub items: Value,
    pub total: String,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub status: OrderStatus,
}

impl Order {
    /// Build a pending order from the raw value stored at
    /// `carts/{user_id}`. The total is computed from the readable entries.
    #[must_use]
    pub fn pending(
        user_id: UserId,
        user_email: Email,
        shipping: Shipping,
        items: Value,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let total = Cart::from_value(&items).totals().total_display();
        Self {
            user_id,
            user_email,
            shipping,
            items,
            total,
            timestamp: placed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            status: OrderStatus::Pending,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn shipping() -> Shipping {
        Shipping {
            name: "Asha".to_string(),
            phone: "0300 1234567".to_string(),
            address: "12 Crescent Road".to_string(),
            city: "Lahore".to_string(),
        }
    }

    #[test]
    fn test_blank_fields() {
        assert!(shipping().blank_fields().is_empty());

        let partial = Shipping {
            phone: "  ".to_string(),
            city: String::new(),
            ..shipping()
        };
        assert_eq!(partial.blank_fields(), ["phone", "city"]);
    }

    #[test]
    fn test_pending_order_serializes_in_storage_shape() {
        let items = json!({
            "-Na": { "name": "Ring", "price": "Rs. 1,200", "image": "r.jpg", "quantity": 2 }
        });
        let placed_at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let order = Order::pending(
            UserId::parse("uid-1").unwrap(),
            Email::parse("asha@example.com").unwrap(),
            shipping(),
            items,
            placed_at,
        );

        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "userId": "uid-1",
                "userEmail": "asha@example.com",
                "shipping": {
                    "name": "Asha",
                    "phone": "0300 1234567",
                    "address": "12 Crescent Road",
                    "city": "Lahore"
                },
                "items": {
                    "-Na": { "name": "Ring", "price": "Rs. 1,200", "image": "r.jpg", "quantity": 2 }
                },
                "total": "Rs. 2,550",
                "timestamp": "2026-10-18T09:30:00.000Z",
                "status": "Pending"
            })
        );
    }

    #[test]
    fn test_items_keep_the_raw_snapshot() {
        let items = json!({
            "-Na": { "name": "Ring", "price": "Rs. 500", "quantity": 1, "engraving": "A+R" },
            "-Nb": "left by an older client",
            "bad.key": { "name": "Chain", "price": "Rs. 300" }
        });
        let order = Order::pending(
            UserId::parse("uid-1").unwrap(),
            Email::parse("asha@example.com").unwrap(),
            shipping(),
            items.clone(),
            Utc::now(),
        );

        assert_eq!(order.items, items);
        assert_eq!(order.total, "Rs. 650");
    }
}
