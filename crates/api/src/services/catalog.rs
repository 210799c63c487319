//! Product catalog operations.
//!
//! Create/list/get/update/delete over the product repository, with payload
//! validation and the ownership check applied uniformly to every mutating
//! operation (update and delete alike).

use std::collections::HashSet;

use sqlx::PgPool;

use hemline_core::ProductId;

use crate::db::products::{ProductFilter, ProductRepository, ProductUpdate};
use crate::db::{Pagination, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{NewProduct, NewVariant, Product, ProductPatch, User, total_stock};

/// Whether a user may mutate a product.
///
/// Products without a recorded creator cannot be mutated by anyone.
#[must_use]
pub fn is_owner(user: &User, product: &Product) -> bool {
    product.created_by == Some(user.id)
}

/// Product catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Create a product owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` on an invalid payload and
    /// `AppError::Conflict` on a duplicate code or SKU.
    pub async fn create(&self, new: NewProduct, caller: &User) -> Result<Product> {
        validate_product_fields(&new.name, &new.code, new.cost)?;
        validate_variants(&new.variants)?;

        let product = self.products.create(&new, caller.id).await?;
        Ok(product)
    }

    /// List products matching the filter, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Product>, i64)> {
        let (products, total) = self.products.list(filter, pagination).await?;
        Ok((products, total))
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it doesn't exist.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.products
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
    }

    /// Apply a partial update to a product the caller owns.
    ///
    /// When the patch replaces the variant list, the denormalized stock
    /// aggregate is recomputed as the sum of the new quantities.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product doesn't exist,
    /// `AppError::Forbidden` if the caller isn't its creator,
    /// `AppError::Validation` on an invalid payload, and
    /// `AppError::Conflict` on a duplicate code or SKU.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        caller: &User,
    ) -> Result<Product> {
        let existing = self.get(id).await?;
        if !is_owner(caller, &existing) {
            return Err(AppError::Forbidden(
                "Only the product's creator can modify it".to_owned(),
            ));
        }

        let update = merge_patch(existing, patch);
        validate_product_fields(&update.name, &update.code, update.cost)?;
        if let Some(variants) = &update.variants {
            validate_variants(variants)?;
        }

        match self.products.update(id, &update).await {
            Ok(product) => Ok(product),
            Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("Product {id}"))),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a product the caller owns. Variants cascade.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product doesn't exist and
    /// `AppError::Forbidden` if the caller isn't its creator.
    pub async fn delete(&self, id: ProductId, caller: &User) -> Result<()> {
        let existing = self.get(id).await?;
        if !is_owner(caller, &existing) {
            return Err(AppError::Forbidden(
                "Only the product's creator can delete it".to_owned(),
            ));
        }

        if !self.products.delete(id).await? {
            return Err(AppError::NotFound(format!("Product {id}")));
        }
        Ok(())
    }
}

/// Merge a partial patch into the stored record, recomputing the stock
/// aggregate when the variant list is replaced.
fn merge_patch(existing: Product, patch: ProductPatch) -> ProductUpdate {
    let stock = patch
        .variants
        .as_deref()
        .map_or(existing.stock, total_stock);

    ProductUpdate {
        name: patch.name.unwrap_or(existing.name),
        code: patch.code.unwrap_or(existing.code),
        description: patch.description.unwrap_or(existing.description),
        cost: patch.cost.unwrap_or(existing.cost),
        category: patch.category.or(existing.category),
        image: patch.image.or(existing.image),
        stock,
        variants: patch.variants,
    }
}

/// Structural checks on the scalar product fields.
fn validate_product_fields(name: &str, code: &str, cost: rust_decimal::Decimal) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_owned()));
    }
    if code.trim().is_empty() {
        return Err(AppError::Validation("code is required".to_owned()));
    }
    if cost.is_sign_negative() {
        return Err(AppError::Validation("cost must not be negative".to_owned()));
    }
    Ok(())
}

/// Structural checks on a submitted variant list.
fn validate_variants(variants: &[NewVariant]) -> Result<()> {
    let mut skus = HashSet::new();
    let mut combinations = HashSet::new();

    for variant in variants {
        if variant.sku.trim().is_empty() {
            return Err(AppError::Validation("variant SKU is required".to_owned()));
        }
        if variant.size.trim().is_empty() || variant.color.trim().is_empty() {
            return Err(AppError::Validation(
                "variant size and color are required".to_owned(),
            ));
        }
        if variant.quantity < 0 {
            return Err(AppError::Validation(
                "variant quantity must not be negative".to_owned(),
            ));
        }
        if !skus.insert(variant.sku.clone()) {
            return Err(AppError::Validation(format!(
                "duplicate SKU in payload: {}",
                variant.sku
            )));
        }
        if !combinations.insert((variant.size.clone(), variant.color.clone())) {
            return Err(AppError::Validation(format!(
                "duplicate size/color combination in payload: {} / {}",
                variant.size, variant.color
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use hemline_core::{Email, UserId, UserRole};

    use super::*;

    fn user(id: i32) -> User {
        User {
            id: UserId::new(id),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(created_by: Option<i32>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Linen Shirt".to_owned(),
            code: "LS-01".to_owned(),
            description: String::new(),
            cost: Decimal::new(1000, 2),
            stock: 5,
            category: None,
            image: None,
            created_by: created_by.map(UserId::new),
            variants: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(sku: &str, size: &str, color: &str, quantity: i32) -> NewVariant {
        NewVariant {
            sku: sku.to_owned(),
            size: size.to_owned(),
            color: color.to_owned(),
            quantity,
        }
    }

    #[test]
    fn test_is_owner() {
        assert!(is_owner(&user(1), &product(Some(1))));
        assert!(!is_owner(&user(2), &product(Some(1))));
        assert!(!is_owner(&user(1), &product(None)));
    }

    #[test]
    fn test_validate_product_fields() {
        assert!(validate_product_fields("Shirt", "S-1", Decimal::TEN).is_ok());
        assert!(validate_product_fields("", "S-1", Decimal::TEN).is_err());
        assert!(validate_product_fields("Shirt", "  ", Decimal::TEN).is_err());
        assert!(validate_product_fields("Shirt", "S-1", Decimal::new(-1, 2)).is_err());
        assert!(validate_product_fields("Shirt", "S-1", Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_validate_variants_rejects_duplicates() {
        let dup_sku = [
            variant("A-1", "M", "Blue", 1),
            variant("A-1", "L", "Blue", 1),
        ];
        assert!(validate_variants(&dup_sku).is_err());

        let dup_combo = [
            variant("A-1", "M", "Blue", 1),
            variant("A-2", "M", "Blue", 1),
        ];
        assert!(validate_variants(&dup_combo).is_err());

        let ok = [
            variant("A-1", "M", "Blue", 1),
            variant("A-2", "L", "Blue", 0),
        ];
        assert!(validate_variants(&ok).is_ok());
    }

    #[test]
    fn test_validate_variants_rejects_negative_quantity() {
        assert!(validate_variants(&[variant("A-1", "M", "Blue", -1)]).is_err());
    }

    #[test]
    fn test_merge_patch_keeps_unset_fields() {
        let existing = product(Some(1));
        let update = merge_patch(existing, ProductPatch::default());
        assert_eq!(update.name, "Linen Shirt");
        assert_eq!(update.code, "LS-01");
        assert_eq!(update.stock, 5);
        assert!(update.variants.is_none());
    }

    #[test]
    fn test_merge_patch_recomputes_stock_from_new_variants() {
        let existing = product(Some(1));
        let patch = ProductPatch {
            variants: Some(vec![
                variant("A-1", "M", "Blue", 3),
                variant("A-2", "L", "Blue", 4),
            ]),
            ..ProductPatch::default()
        };
        let update = merge_patch(existing, patch);
        assert_eq!(update.stock, 7);
    }
}
