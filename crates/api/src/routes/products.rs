//! Product catalog routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hemline_core::ProductId;

use crate::db::Pagination;
use crate::db::products::{ProductFilter, ProductSort};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::services::CatalogService;
use crate::state::AppState;

use super::MessageResponse;

/// Raw listing query parameters.
///
/// Numeric fields arrive as strings so malformed values can fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub min_cost: Option<String>,
    pub max_cost: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ProductListParams {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            min_cost: parse_or_none::<Decimal>(self.min_cost.as_deref()),
            max_cost: parse_or_none::<Decimal>(self.max_cost.as_deref()),
            sort: ProductSort::parse(self.sort.as_deref()),
        }
    }

    fn pagination(&self) -> Pagination {
        Pagination::from_params(
            parse_or_none::<i64>(self.page.as_deref()),
            parse_or_none::<i64>(self.limit.as_deref()),
        )
    }
}

fn parse_or_none<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.parse().ok())
}

/// Response carrying one product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub ok: bool,
    pub message: String,
    pub product: Product,
}

/// Response carrying a page of products.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub ok: bool,
    pub message: String,
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// List products with filters, sorting, and pagination.
///
/// GET /api/products
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<ProductListResponse>> {
    let pagination = params.pagination();
    let (products, total) = CatalogService::new(state.pool())
        .list(&params.filter(), pagination)
        .await?;

    Ok(Json(ProductListResponse {
        ok: true,
        message: "Products".to_owned(),
        products,
        total,
        page: pagination.page(),
        pages: pagination.page_count(total),
    }))
}

/// Fetch one product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product doesn't exist.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>> {
    let product = CatalogService::new(state.pool())
        .get(ProductId::new(id))
        .await?;

    Ok(Json(ProductResponse {
        ok: true,
        message: "Product".to_owned(),
        product,
    }))
}

/// Create a product owned by the caller.
///
/// POST /api/products
///
/// # Errors
///
/// Returns 400 on an invalid payload and 409 on a duplicate code or SKU.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(new): Json<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool()).create(new, &user).await?;

    tracing::info!(product_id = %product.id, user_id = %user.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            ok: true,
            message: "Product created".to_owned(),
            product,
        }),
    ))
}

/// Update a product the caller owns.
///
/// PUT /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product doesn't exist, 403 if the caller isn't its
/// creator, 400 on an invalid payload, and 409 on a duplicate code or SKU.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductResponse>> {
    let product = CatalogService::new(state.pool())
        .update(ProductId::new(id), patch, &user)
        .await?;

    Ok(Json(ProductResponse {
        ok: true,
        message: "Product updated".to_owned(),
        product,
    }))
}

/// Delete a product the caller owns.
///
/// DELETE /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product doesn't exist and 403 if the caller isn't
/// its creator.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>> {
    CatalogService::new(state.pool())
        .delete(ProductId::new(id), &user)
        .await?;

    tracing::info!(product_id = id, user_id = %user.id, "Product deleted");

    Ok(Json(MessageResponse {
        ok: true,
        message: "Product deleted".to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_numeric_params_fall_back() {
        let params = ProductListParams {
            page: Some("two".to_owned()),
            limit: Some("-3".to_owned()),
            min_cost: Some("cheap".to_owned()),
            ..ProductListParams::default()
        };

        let pagination = params.pagination();
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.limit(), 10);
        assert!(params.filter().min_cost.is_none());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let params = ProductListParams {
            search: Some("   ".to_owned()),
            ..ProductListParams::default()
        };
        assert!(params.filter().search.is_none());
    }

    #[test]
    fn test_cost_range_parses() {
        let params = ProductListParams {
            min_cost: Some("9.99".to_owned()),
            max_cost: Some("20".to_owned()),
            ..ProductListParams::default()
        };
        let filter = params.filter();
        assert_eq!(filter.min_cost, Some(Decimal::new(999, 2)));
        assert_eq!(filter.max_cost, Some(Decimal::new(20, 0)));
    }
}
