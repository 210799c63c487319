//! Order repository for database operations.
//!
//! Reads go through [`OrderRepository`]. The write half of order placement
//! is exposed as free functions over a `PgConnection` so the placement
//! service can run lookup, insert, and stock decrement inside one
//! transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use hemline_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use super::{Pagination, RepositoryError};
use crate::models::{CustomerSummary, NewOrder, Order, OrderItem, ShippingAddress};

/// Row shape for order queries, with the customer identity joined in.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    status: String,
    payment_status: String,
    payment_method: String,
    ship_first_name: String,
    ship_last_name: String,
    ship_email: String,
    ship_phone: String,
    ship_address: String,
    ship_city: String,
    ship_state: String,
    ship_zip: String,
    ship_notes: String,
    subtotal: Decimal,
    shipping_cost: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    customer_name: Option<String>,
    customer_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let payment_status: PaymentStatus = self.payment_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        let customer = match (self.customer_name, self.customer_email) {
            (Some(name), Some(email)) => Some(CustomerSummary { name, email }),
            _ => None,
        };

        Ok(Order {
            id: OrderId::new(self.id),
            customer,
            status,
            payment_status,
            payment_method: self.payment_method,
            shipping: ShippingAddress {
                first_name: self.ship_first_name,
                last_name: self.ship_last_name,
                email: self.ship_email,
                phone: self.ship_phone,
                address: self.ship_address,
                city: self.ship_city,
                state: self.ship_state,
                zip: self.ship_zip,
                notes: self.ship_notes,
            },
            items,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row shape for order item queries.
#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: i32,
    sku: String,
    name: String,
    image: Option<String>,
    size: String,
    color: String,
    cost: Decimal,
    quantity: i32,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(self.product_id),
            sku: self.sku,
            name: self.name,
            image: self.image,
            size: self.size,
            color: self.color,
            cost: self.cost,
            quantity: self.quantity,
        }
    }
}

const SELECT_ORDER: &str = r"
    SELECT o.id, o.status, o.payment_status, o.payment_method,
           o.ship_first_name, o.ship_last_name, o.ship_email, o.ship_phone,
           o.ship_address, o.ship_city, o.ship_state, o.ship_zip, o.ship_notes,
           o.subtotal, o.shipping_cost, o.tax_amount, o.total_amount,
           u.name AS customer_name, u.email AS customer_email,
           o.created_at, o.updated_at
    FROM orders o
    LEFT JOIN users u ON u.id = o.customer
";

/// Filters for the order listing query.
#[derive(Debug, Default)]
pub struct OrderFilter {
    /// Only orders in this status.
    pub status: Option<OrderStatus>,
    /// Only orders placed by this customer.
    pub customer: Option<UserId>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its items and customer projection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT order_id, product_id, sku, name, image, size, color, cost, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let items = items.into_iter().map(OrderItemRow::into_item).collect();
        row.into_order(items).map(Some)
    }

    /// List orders newest-first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        const MATCH: &str = r"
            ($1::text IS NULL OR o.status = $1)
            AND ($2::integer IS NULL OR o.customer = $2)
        ";

        let status = filter.status.map(OrderStatus::as_str);

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM orders o WHERE {MATCH}"
        ))
        .bind(status)
        .bind(filter.customer)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            {SELECT_ORDER}
            WHERE {MATCH}
            ORDER BY o.created_at DESC
            LIMIT $3 OFFSET $4
            ",
        ))
        .bind(status)
        .bind(filter.customer)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_by_order(&ids).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let list = items.remove(&row.id).unwrap_or_default();
            orders.push(row.into_order(list)?);
        }

        Ok((orders, total))
    }

    /// Overwrite an order's status and bump `updated_at`.
    ///
    /// Transition legality is checked by the caller; this is a plain write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Load items for a set of orders, grouped by order ID.
    async fn items_by_order(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT order_id, product_id, sku, name, image, size, color, cost, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(row.into_item());
        }
        Ok(grouped)
    }
}

// =============================================================================
// Placement primitives (run inside the placement transaction)
// =============================================================================

/// A product as seen by the placement flow: current price and live variant
/// stock.
#[derive(Debug, Clone)]
pub struct PurchaseProduct {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub cost: Decimal,
    pub variants: Vec<PurchaseVariant>,
}

/// One variant's live state at validation time.
#[derive(Debug, Clone)]
pub struct PurchaseVariant {
    pub sku: String,
    pub size: String,
    pub color: String,
    pub quantity: i32,
}

/// Fetch the snapshot of a product the placement flow validates against.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn purchase_snapshot(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<PurchaseProduct>, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct Head {
        id: i32,
        name: String,
        image: Option<String>,
        cost: Decimal,
    }

    let head: Option<Head> =
        sqlx::query_as("SELECT id, name, image, cost FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(head) = head else {
        return Ok(None);
    };

    #[derive(sqlx::FromRow)]
    struct VariantState {
        sku: String,
        size: String,
        color: String,
        quantity: i32,
    }

    let variants: Vec<VariantState> = sqlx::query_as(
        r"
        SELECT sku, size, color, quantity
        FROM product_variants
        WHERE product_id = $1
        ORDER BY id ASC
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(PurchaseProduct {
        id: ProductId::new(head.id),
        name: head.name,
        image: head.image,
        cost: head.cost,
        variants: variants
            .into_iter()
            .map(|v| PurchaseVariant {
                sku: v.sku,
                size: v.size,
                color: v.color,
                quantity: v.quantity,
            })
            .collect(),
    }))
}

/// Insert an order and its item snapshots, returning the new order ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder,
    customer: Option<UserId>,
    items: &[OrderItem],
) -> Result<OrderId, RepositoryError> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO orders (customer, payment_method,
                            ship_first_name, ship_last_name, ship_email, ship_phone,
                            ship_address, ship_city, ship_state, ship_zip, ship_notes,
                            subtotal, shipping_cost, tax_amount, total_amount)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING id
        ",
    )
    .bind(customer)
    .bind(&order.payment_method)
    .bind(&order.shipping.first_name)
    .bind(&order.shipping.last_name)
    .bind(&order.shipping.email)
    .bind(&order.shipping.phone)
    .bind(&order.shipping.address)
    .bind(&order.shipping.city)
    .bind(&order.shipping.state)
    .bind(&order.shipping.zip)
    .bind(&order.shipping.notes)
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.tax_amount)
    .bind(order.total_amount)
    .fetch_one(&mut *conn)
    .await?;

    let order_id = OrderId::new(id);

    for item in items {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, sku, name, image,
                                     size, color, cost, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.image)
        .bind(&item.size)
        .bind(&item.color)
        .bind(item.cost)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }

    Ok(order_id)
}

/// Conditionally decrement one variant's stock.
///
/// The predicate `quantity >= $3` makes the decrement atomic: a concurrent
/// order that drained the variant after validation makes this a zero-row
/// update instead of driving stock negative. The denormalized
/// `products.stock` aggregate is decremented alongside.
///
/// Returns `false` when the variant no longer holds enough stock (or was
/// deleted); the caller rolls back.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    sku: &str,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE product_variants
        SET quantity = quantity - $3
        WHERE product_id = $1 AND sku = $2 AND quantity >= $3
        ",
    )
    .bind(product_id)
    .bind(sku)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r"
        UPDATE products
        SET stock = stock - $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(true)
}

/// Current stock of one variant, for reporting after a lost decrement race.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn variant_quantity(
    conn: &mut PgConnection,
    product_id: ProductId,
    sku: &str,
) -> Result<Option<i32>, RepositoryError> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT quantity FROM product_variants WHERE product_id = $1 AND sku = $2",
    )
    .bind(product_id)
    .bind(sku)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|r| r.0))
}
