//! Product repository for database operations.
//!
//! Products and their variants are always written together inside a
//! transaction so the denormalized `stock` column can never drift from the
//! variant quantities it summarizes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use hemline_core::{ProductId, UserId, VariantId};

use super::{Pagination, RepositoryError};
use crate::models::{NewProduct, NewVariant, Product, Variant, total_stock};

/// Row shape for product queries.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    code: String,
    description: String,
    cost: Decimal,
    stock: i32,
    category: Option<String>,
    image: Option<String>,
    created_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<Variant>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            code: self.code,
            description: self.description,
            cost: self.cost,
            stock: self.stock,
            category: self.category,
            image: self.image,
            created_by: self.created_by.map(UserId::new),
            variants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row shape for variant queries.
#[derive(sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    sku: String,
    size: String,
    color: String,
    quantity: i32,
}

impl VariantRow {
    fn into_variant(self) -> Variant {
        Variant {
            id: VariantId::new(self.id),
            sku: self.sku,
            size: self.size,
            color: self.color,
            quantity: self.quantity,
        }
    }
}

/// Sort order for product listings.
///
/// Parsed from the `sort` query parameter; a `-` prefix flips the direction
/// (`-cost` = most expensive first). Unknown or missing keys fall back to
/// newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    NameAsc,
    NameDesc,
    CostAsc,
    CostDesc,
    StockAsc,
    StockDesc,
}

impl ProductSort {
    /// Parse a raw `sort` parameter, falling back to the default.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let (key, descending) = raw
            .strip_prefix('-')
            .map_or((raw, false), |stripped| (stripped, true));

        match (key, descending) {
            ("name", false) => Self::NameAsc,
            ("name", true) => Self::NameDesc,
            ("cost", false) => Self::CostAsc,
            ("cost", true) => Self::CostDesc,
            ("stock", false) => Self::StockAsc,
            ("stock", true) => Self::StockDesc,
            _ => Self::default(),
        }
    }

    /// The `ORDER BY` clause for this sort. Whitelisted, never interpolated
    /// from user input.
    const fn order_clause(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC",
            Self::NameAsc => "name ASC",
            Self::NameDesc => "name DESC",
            Self::CostAsc => "cost ASC",
            Self::CostDesc => "cost DESC",
            Self::StockAsc => "stock ASC",
            Self::StockDesc => "stock DESC",
        }
    }
}

/// Filters for the product listing query.
#[derive(Debug, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// Inclusive lower bound on cost.
    pub min_cost: Option<Decimal>,
    /// Inclusive upper bound on cost.
    pub max_cost: Option<Decimal>,
    /// Sort order.
    pub sort: ProductSort,
}

/// Full replacement values for a product update.
///
/// The caller merges the client's partial patch into the stored record
/// before handing it here; `stock` is the recomputed variant-quantity sum
/// whenever `variants` is present.
#[derive(Debug)]
pub struct ProductUpdate {
    pub name: String,
    pub code: String,
    pub description: String,
    pub cost: Decimal,
    pub category: Option<String>,
    pub image: Option<String>,
    pub stock: i32,
    /// `Some` replaces the whole variant set; `None` leaves it unchanged.
    pub variants: Option<Vec<NewVariant>>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product and its variants in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a duplicate code, SKU, or
    /// (size, color) pair. Returns `RepositoryError::Database` for other
    /// database errors.
    pub async fn create(
        &self,
        new: &NewProduct,
        created_by: UserId,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(
            r"
            INSERT INTO products (name, code, description, cost, stock, category, image, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, code, description, cost, stock, category, image,
                      created_by, created_at, updated_at
            ",
        )
        .bind(&new.name)
        .bind(&new.code)
        .bind(&new.description)
        .bind(new.cost)
        .bind(total_stock(&new.variants))
        .bind(&new.category)
        .bind(&new.image)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let product_id = ProductId::new(row.id);
        let variants = insert_variants(&mut tx, product_id, &new.variants).await?;

        tx.commit().await?;

        Ok(row.into_product(variants))
    }

    /// Get a product with its variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, code, description, cost, stock, category, image,
                   created_by, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let variants: Vec<VariantRow> = sqlx::query_as(
            r"
            SELECT id, product_id, sku, size, color, quantity
            FROM product_variants
            WHERE product_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let variants = variants.into_iter().map(VariantRow::into_variant).collect();
        Ok(Some(row.into_product(variants)))
    }

    /// List products matching the filter, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        const MATCH: &str = r"
            ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
            AND ($2::numeric IS NULL OR cost >= $2)
            AND ($3::numeric IS NULL OR cost <= $3)
        ";

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {MATCH}"))
                .bind(&filter.search)
                .bind(filter.min_cost)
                .bind(filter.max_cost)
                .fetch_one(self.pool)
                .await?;

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT id, name, code, description, cost, stock, category, image,
                   created_by, created_at, updated_at
            FROM products
            WHERE {MATCH}
            ORDER BY {order}
            LIMIT $4 OFFSET $5
            ",
            order = filter.sort.order_clause()
        ))
        .bind(&filter.search)
        .bind(filter.min_cost)
        .bind(filter.max_cost)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut variants = self.variants_by_product(&ids).await?;

        let products = rows
            .into_iter()
            .map(|row| {
                let list = variants.remove(&row.id).unwrap_or_default();
                row.into_product(list)
            })
            .collect();

        Ok((products, total))
    }

    /// Overwrite a product's fields and optionally replace its variant set,
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` on a duplicate code, SKU, or
    /// (size, color) pair.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<ProductRow> = sqlx::query_as(
            r"
            UPDATE products
            SET name = $2, code = $3, description = $4, cost = $5,
                category = $6, image = $7, stock = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, code, description, cost, stock, category, image,
                      created_by, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.code)
        .bind(&update.description)
        .bind(update.cost)
        .bind(&update.category)
        .bind(&update.image)
        .bind(update.stock)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        let variants = if let Some(new_variants) = &update.variants {
            sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_variants(&mut tx, id, new_variants).await?
        } else {
            let rows: Vec<VariantRow> = sqlx::query_as(
                r"
                SELECT id, product_id, sku, size, color, quantity
                FROM product_variants
                WHERE product_id = $1
                ORDER BY id ASC
                ",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
            rows.into_iter().map(VariantRow::into_variant).collect()
        };

        tx.commit().await?;

        Ok(row.into_product(variants))
    }

    /// Delete a product. Variants cascade.
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Load variants for a set of products, grouped by product ID.
    async fn variants_by_product(
        &self,
        product_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<Variant>>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<VariantRow> = sqlx::query_as(
            r"
            SELECT id, product_id, sku, size, color, quantity
            FROM product_variants
            WHERE product_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<Variant>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.product_id)
                .or_default()
                .push(row.into_variant());
        }
        Ok(grouped)
    }
}

/// Insert a variant list for a product inside an open transaction.
async fn insert_variants(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    variants: &[NewVariant],
) -> Result<Vec<Variant>, RepositoryError> {
    let mut inserted = Vec::with_capacity(variants.len());

    for variant in variants {
        let row: VariantRow = sqlx::query_as(
            r"
            INSERT INTO product_variants (product_id, sku, size, color, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, sku, size, color, quantity
            ",
        )
        .bind(product_id)
        .bind(&variant.sku)
        .bind(&variant.size)
        .bind(&variant.color)
        .bind(variant.quantity)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_unique_violation)?;

        inserted.push(row.into_variant());
    }

    Ok(inserted)
}

/// Map a unique-constraint violation to `Conflict` with a message naming
/// the offending constraint.
fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("products_code_key") => "product code already exists",
            Some("product_variants_sku_key") => "SKU already exists",
            Some("product_variants_product_id_size_color_key") => {
                "duplicate size/color combination"
            }
            _ => "unique constraint violated",
        };
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse_known_keys() {
        assert_eq!(ProductSort::parse(Some("name")), ProductSort::NameAsc);
        assert_eq!(ProductSort::parse(Some("-name")), ProductSort::NameDesc);
        assert_eq!(ProductSort::parse(Some("cost")), ProductSort::CostAsc);
        assert_eq!(ProductSort::parse(Some("-cost")), ProductSort::CostDesc);
        assert_eq!(ProductSort::parse(Some("stock")), ProductSort::StockAsc);
        assert_eq!(ProductSort::parse(Some("-stock")), ProductSort::StockDesc);
    }

    #[test]
    fn test_sort_parse_falls_back_to_newest() {
        assert_eq!(ProductSort::parse(None), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("price")), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("")), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("-")), ProductSort::Newest);
    }

    #[test]
    fn test_order_clauses_are_whitelisted() {
        // Every variant maps to a fixed clause; user input never reaches SQL.
        for (sort, clause) in [
            (ProductSort::Newest, "created_at DESC"),
            (ProductSort::NameAsc, "name ASC"),
            (ProductSort::CostDesc, "cost DESC"),
            (ProductSort::StockAsc, "stock ASC"),
        ] {
            assert_eq!(sort.order_clause(), clause);
        }
    }
}
