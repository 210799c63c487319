//! Product catalog domain types.
//!
//! A product owns an ordered list of variants; each variant is one
//! purchasable (size, color) configuration with its own SKU and stock count.
//! The product's `stock` field is denormalized - always the sum of its
//! variant quantities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hemline_core::{ProductId, UserId, VariantId};

/// A catalog entry (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Merchant-assigned code, unique across the catalog.
    pub code: String,
    /// Free-form description.
    pub description: String,
    /// Unit price. Uniform across the product's variants.
    pub cost: Decimal,
    /// Denormalized total stock: sum of all variant quantities.
    pub stock: i32,
    /// Optional category tag.
    pub category: Option<String>,
    /// Optional image URL.
    pub image: Option<String>,
    /// User who created the product; authorizes updates and deletes.
    pub created_by: Option<UserId>,
    /// Purchasable (size, color) configurations.
    pub variants: Vec<Variant>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One purchasable (size, color) configuration of a product.
///
/// Owned exclusively by its parent product. SKUs are unique across the whole
/// catalog, not just within one product.
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    /// Database ID of this variant.
    pub id: VariantId,
    /// Stock-keeping unit identifier.
    pub sku: String,
    /// Size label (e.g. "M").
    pub size: String,
    /// Color label (e.g. "Blue").
    pub color: String,
    /// Units on hand. Never negative.
    pub quantity: i32,
}

/// Payload for creating a product.
#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub cost: Decimal,
    pub category: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}

/// Variant payload as submitted by clients. The database assigns the ID.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVariant {
    pub sku: String,
    pub size: String,
    pub color: String,
    pub quantity: i32,
}

/// Partial update for a product. Omitted fields are left unchanged; a
/// present `variants` list replaces the whole variant set.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub variants: Option<Vec<NewVariant>>,
}

/// Total stock across a variant list - the value persisted into the
/// denormalized `stock` column whenever variants change.
#[must_use]
pub fn total_stock(variants: &[NewVariant]) -> i32 {
    variants.iter().map(|v| v.quantity).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(sku: &str, quantity: i32) -> NewVariant {
        NewVariant {
            sku: sku.to_string(),
            size: "M".to_string(),
            color: "Blue".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_total_stock_sums_quantities() {
        let variants = vec![variant("A-1", 3), variant("A-2", 0), variant("A-3", 7)];
        assert_eq!(total_stock(&variants), 10);
    }

    #[test]
    fn test_total_stock_empty_list() {
        assert_eq!(total_stock(&[]), 0);
    }
}
