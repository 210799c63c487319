//! Order routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use hemline_core::{OrderId, UserId};

use crate::db::Pagination;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{NewOrder, Order};
use crate::services::OrderService;
use crate::state::AppState;

/// Raw listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub customer: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Response carrying one order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub ok: bool,
    pub message: String,
    pub order: Order,
}

/// Response carrying a page of orders.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub ok: bool,
    pub message: String,
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// Request to move an order to a new status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Place an order. Guests are first-class callers: without a valid
/// session the order simply carries no customer reference.
///
/// POST /api/orders
///
/// # Errors
///
/// Returns 400 for an empty cart, a stock shortfall, or a stale price,
/// and 404 for a missing product or variant combination.
pub async fn place(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(new): Json<NewOrder>,
) -> Result<impl IntoResponse> {
    let customer = user.map(|u| u.id);
    let order = OrderService::new(state.pool()).place(new, customer).await?;

    tracing::info!(order_id = %order.id, guest = customer.is_none(), "Order placed");

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            ok: true,
            message: "Order placed".to_owned(),
            order,
        }),
    ))
}

/// List orders newest-first, filterable by status and customer.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns 400 for an unknown status filter.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<OrderListResponse>> {
    let pagination = Pagination::from_params(
        params.page.as_deref().and_then(|s| s.parse().ok()),
        params.limit.as_deref().and_then(|s| s.parse().ok()),
    );
    let customer = params
        .customer
        .as_deref()
        .and_then(|s| s.parse().ok())
        .map(UserId::new);

    let (orders, total) = OrderService::new(state.pool())
        .list(params.status.as_deref(), customer, pagination)
        .await?;

    Ok(Json(OrderListResponse {
        ok: true,
        message: "Orders".to_owned(),
        orders,
        total,
        page: pagination.page(),
        pages: pagination.page_count(total),
    }))
}

/// Fetch one order.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 if the order doesn't exist.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool()).get(OrderId::new(id)).await?;

    Ok(Json(OrderResponse {
        ok: true,
        message: "Order".to_owned(),
        order,
    }))
}

/// Move an order to a new status.
///
/// PUT /api/orders/{id}/status
///
/// # Errors
///
/// Returns 400 when the status field is omitted, unknown, or an illegal
/// transition, and 404 if the order doesn't exist.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>> {
    let status = req
        .status
        .ok_or_else(|| AppError::InvalidRequest("status is required".to_owned()))?;

    let order = OrderService::new(state.pool())
        .update_status(OrderId::new(id), &status)
        .await?;

    Ok(Json(OrderResponse {
        ok: true,
        message: "Order status updated".to_owned(),
        order,
    }))
}
