//! Order domain types.
//!
//! An order is immutable once created except for its status fields: items
//! and the shipping address are snapshots taken at purchase time and are
//! never reconciled against the live catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hemline_core::{OrderId, OrderStatus, PaymentStatus, ProductId};

/// A purchase record.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Customer identity projection, `None` for guest checkout.
    pub customer: Option<CustomerSummary>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Payment method label as submitted at checkout.
    pub payment_method: String,
    /// Shipping address snapshot.
    pub shipping: ShippingAddress,
    /// Line items snapshotted at purchase time.
    pub items: Vec<OrderItem>,
    /// Sum of line costs as computed at checkout.
    pub subtotal: Decimal,
    /// Shipping charge.
    pub shipping_cost: Decimal,
    /// Tax charge.
    pub tax_amount: Decimal,
    /// Grand total.
    pub total_amount: Decimal,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A line item frozen at purchase time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// Product the line was purchased from.
    pub product_id: ProductId,
    /// SKU of the purchased variant.
    pub sku: String,
    /// Product name at purchase time.
    pub name: String,
    /// Product image at purchase time.
    pub image: Option<String>,
    /// Size label of the purchased variant.
    pub size: String,
    /// Color label of the purchased variant.
    pub color: String,
    /// Unit cost at purchase time.
    pub cost: Decimal,
    /// Units purchased.
    pub quantity: i32,
}

/// The identity projection of an order's customer: name and email only.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
}

/// Shipping details captured with the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub notes: String,
}

/// One line of a submitted cart.
///
/// `cost` is the unit cost the client last saw; placement fails when it no
/// longer matches the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: i32,
    pub cost: Decimal,
}

/// Payload for placing an order.
#[derive(Debug, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub items: Vec<CartLine>,
    pub shipping: ShippingAddress,
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_deserializes_with_defaults() {
        let order: NewOrder = serde_json::from_str(
            r#"{
                "items": [
                    {"product_id": 1, "size": "M", "color": "Blue", "quantity": 3, "cost": "10.00"}
                ],
                "shipping": {
                    "first_name": "Ada", "last_name": "Lovelace",
                    "email": "ada@example.com", "phone": "555-0100",
                    "address": "1 Analytical Way", "city": "London",
                    "state": "LDN", "zip": "00001"
                },
                "subtotal": "30.00",
                "total_amount": "33.50",
                "payment_method": "card"
            }"#,
        )
        .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.shipping.notes, "");
        assert_eq!(order.shipping_cost, Decimal::ZERO);
        assert_eq!(order.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn test_empty_items_when_omitted() {
        let order: NewOrder = serde_json::from_str(
            r#"{
                "shipping": {
                    "first_name": "A", "last_name": "B", "email": "a@b.c",
                    "phone": "1", "address": "x", "city": "y", "state": "z", "zip": "0"
                },
                "subtotal": "0", "total_amount": "0", "payment_method": "card"
            }"#,
        )
        .unwrap();
        assert!(order.items.is_empty());
    }
}
