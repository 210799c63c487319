//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (pings the database)
//!
//! # Auth
//! POST /api/auth/register         - Create account, set session cookie
//! POST /api/auth/login            - Authenticate, set session cookie
//! POST /api/auth/logout           - Clear session cookie
//! GET  /api/auth/profile          - Caller's profile (session)
//! GET  /api/auth/admin-check      - Role probe (session + admin)
//!
//! # Products
//! GET    /api/products            - Paginated/filterable product list
//! POST   /api/products            - Create product (session)
//! GET    /api/products/{id}       - Fetch one product
//! PUT    /api/products/{id}       - Update product (session + ownership)
//! DELETE /api/products/{id}       - Delete product (session + ownership)
//!
//! # Orders
//! POST /api/orders                - Place order (guest checkout permitted)
//! GET  /api/orders                - List orders, filterable by status/customer
//! GET  /api/orders/{id}           - Fetch one order
//! PUT  /api/orders/{id}/status    - Set order status
//! ```
//!
//! Every success body carries `ok: true`, a message, and a payload field
//! named after the resource; list endpoints add `total`, `page`, `pages`.

pub mod auth;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Response carrying only an outcome message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: String,
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .route("/admin-check", get(auth::admin_check))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::place).get(orders::list))
        .route("/{id}", get(orders::get))
        .route("/{id}/status", put(orders::update_status))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
}
