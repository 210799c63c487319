//! Order placement and order management.
//!
//! Placement runs validation, the order insert, and the stock decrement
//! inside a single database transaction. The decrement itself is
//! conditional (`quantity >= requested`), so a concurrent order that
//! drained a variant between validation and write turns into a zero-row
//! update; the placement fails and the whole transaction rolls back,
//! leaving no order row behind and no stock oversold.

use sqlx::PgPool;

use hemline_core::{OrderId, OrderStatus, UserId};

use crate::db::orders::{
    OrderFilter, OrderRepository, PurchaseProduct, decrement_stock, insert_order,
    purchase_snapshot, variant_quantity,
};
use crate::db::{Pagination, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{CartLine, NewOrder, Order, OrderItem};

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for the submitted cart.
    ///
    /// Validates every line against live catalog state, snapshots the lines
    /// as order items, and decrements the matched variants' stock - all in
    /// one transaction. Any failure rolls the whole placement back.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidRequest` for an empty cart,
    /// `AppError::NotFound` for a missing product or variant combination,
    /// `AppError::InsufficientStock` when a line exceeds available stock,
    /// and `AppError::PriceMismatch` when a line's asserted cost is stale.
    pub async fn place(&self, order: NewOrder, customer: Option<UserId>) -> Result<Order> {
        if order.items.is_empty() {
            return Err(AppError::InvalidRequest("cart is empty".to_owned()));
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        let mut items = Vec::with_capacity(order.items.len());
        for line in &order.items {
            let product = purchase_snapshot(&mut tx, line.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Product {}", line.product_id)))?;
            items.push(validate_line(line, &product)?);
        }

        let order_id = insert_order(&mut tx, &order, customer, &items).await?;

        for item in &items {
            let decremented =
                decrement_stock(&mut tx, item.product_id, &item.sku, item.quantity).await?;
            if !decremented {
                // A concurrent order won the race after our validation
                // read. Dropping the transaction discards the order row.
                let available = variant_quantity(&mut tx, item.product_id, &item.sku)
                    .await?
                    .unwrap_or(0);
                return Err(AppError::InsufficientStock {
                    product: item.name.clone(),
                    size: item.size.clone(),
                    color: item.color.clone(),
                    available,
                });
            }
        }

        tx.commit().await.map_err(RepositoryError::Database)?;

        self.get(order_id).await
    }

    /// List orders newest-first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unknown status filter.
    pub async fn list(
        &self,
        status: Option<&str>,
        customer: Option<UserId>,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64)> {
        let status = status
            .map(str::parse::<OrderStatus>)
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let filter = OrderFilter { status, customer };
        let (orders, total) = OrderRepository::new(self.pool)
            .list(&filter, pagination)
            .await?;
        Ok((orders, total))
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it doesn't exist.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {id}")))
    }

    /// Move an order to a new status.
    ///
    /// Transitions are forward-only (`Pending -> Processing -> Shipped ->
    /// Delivered`); `Cancelled` is reachable from any non-terminal state,
    /// and terminal states admit no exit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unknown status value or an
    /// illegal transition, and `AppError::NotFound` if the order doesn't
    /// exist.
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order> {
        let next: OrderStatus = status
            .parse()
            .map_err(|e: hemline_core::StatusParseError| AppError::Validation(e.to_string()))?;

        let order = self.get(id).await?;
        if !order.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "cannot move order from {} to {next}",
                order.status
            )));
        }

        match OrderRepository::new(self.pool).set_status(id, next).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                return Err(AppError::NotFound(format!("Order {id}")));
            }
            Err(e) => return Err(e.into()),
        }

        self.get(id).await
    }
}

/// Validate one cart line against the product's live state and produce the
/// item snapshot to persist.
///
/// Checks run in this order: variant existence, stock sufficiency, price
/// consistency. The price check is at whole-product granularity - variants
/// of a product share its cost.
fn validate_line(line: &CartLine, product: &PurchaseProduct) -> Result<OrderItem> {
    if line.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let variant = product
        .variants
        .iter()
        .find(|v| v.size == line.size && v.color == line.color)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Variant {} / {} of {}",
                line.size, line.color, product.name
            ))
        })?;

    if line.quantity > variant.quantity {
        return Err(AppError::InsufficientStock {
            product: product.name.clone(),
            size: variant.size.clone(),
            color: variant.color.clone(),
            available: variant.quantity,
        });
    }

    if line.cost != product.cost {
        return Err(AppError::PriceMismatch {
            product: product.name.clone(),
        });
    }

    Ok(OrderItem {
        product_id: product.id,
        sku: variant.sku.clone(),
        name: product.name.clone(),
        image: product.image.clone(),
        size: variant.size.clone(),
        color: variant.color.clone(),
        cost: product.cost,
        quantity: line.quantity,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use hemline_core::ProductId;

    use crate::db::orders::PurchaseVariant;
    use crate::models::ShippingAddress;

    use super::*;

    fn snapshot() -> PurchaseProduct {
        PurchaseProduct {
            id: ProductId::new(1),
            name: "Linen Shirt".to_owned(),
            image: Some("linen-shirt.jpg".to_owned()),
            cost: Decimal::new(1000, 2),
            variants: vec![
                PurchaseVariant {
                    sku: "P-M-BL".to_owned(),
                    size: "M".to_owned(),
                    color: "Blue".to_owned(),
                    quantity: 5,
                },
                PurchaseVariant {
                    sku: "P-L-BL".to_owned(),
                    size: "L".to_owned(),
                    color: "Blue".to_owned(),
                    quantity: 0,
                },
            ],
        }
    }

    fn line(size: &str, color: &str, quantity: i32, cost: Decimal) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            size: size.to_owned(),
            color: color.to_owned(),
            quantity,
            cost,
        }
    }

    #[test]
    fn test_valid_line_snapshots_the_variant() {
        let item = validate_line(&line("M", "Blue", 3, Decimal::new(1000, 2)), &snapshot()).unwrap();
        assert_eq!(item.sku, "P-M-BL");
        assert_eq!(item.name, "Linen Shirt");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.cost, Decimal::new(1000, 2));
    }

    #[test]
    fn test_missing_variant_combination() {
        let err = validate_line(&line("XL", "Blue", 1, Decimal::new(1000, 2)), &snapshot())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        // Size and color paired: size exists, color doesn't.
        let err =
            validate_line(&line("M", "Red", 1, Decimal::new(1000, 2)), &snapshot()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_insufficient_stock_reports_available() {
        let err =
            validate_line(&line("M", "Blue", 6, Decimal::new(1000, 2)), &snapshot()).unwrap_err();
        match err {
            AppError::InsufficientStock { available, .. } => assert_eq!(available, 5),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // A drained variant still exists; asking for one unit is a stock
        // failure, not a missing variant.
        let err =
            validate_line(&line("L", "Blue", 1, Decimal::new(1000, 2)), &snapshot()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock { available: 0, .. }
        ));
    }

    #[test]
    fn test_stale_price_rejected() {
        let err =
            validate_line(&line("M", "Blue", 1, Decimal::new(999, 2)), &snapshot()).unwrap_err();
        assert!(matches!(err, AppError::PriceMismatch { .. }));
    }

    #[test]
    fn test_stock_checked_before_price() {
        // A line failing both checks reports the stock failure.
        let err =
            validate_line(&line("M", "Blue", 6, Decimal::new(999, 2)), &snapshot()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let err =
            validate_line(&line("M", "Blue", 0, Decimal::new(1000, 2)), &snapshot()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_exact_stock_is_allowed() {
        let item = validate_line(&line("M", "Blue", 5, Decimal::new(1000, 2)), &snapshot()).unwrap();
        assert_eq!(item.quantity, 5);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_any_database_work() {
        // A lazy pool never connects; the empty-cart check fires first.
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let service = OrderService::new(&pool);

        let order = NewOrder {
            items: Vec::new(),
            shipping: ShippingAddress {
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                email: "ada@example.com".to_owned(),
                phone: "555-0100".to_owned(),
                address: "1 Analytical Way".to_owned(),
                city: "London".to_owned(),
                state: "LDN".to_owned(),
                zip: "00001".to_owned(),
                notes: String::new(),
            },
            subtotal: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            payment_method: "card".to_owned(),
        };

        let err = service.place(order, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
