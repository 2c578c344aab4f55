//! Route definitions for the Business Management Platform

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory
        .nest("/inventory", inventory_routes())
        // Protected routes - finance
        .nest("/finance", finance_routes())
}

/// Inventory routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Stock ledger
        .route("/stocks", get(handlers::list_stocks))
        .route("/stocks/in", post(handlers::stock_in))
        .route("/stocks/reserve", post(handlers::reserve_stock))
        .route("/stocks/release", post(handlers::release_stock))
        .route("/stocks/consume", post(handlers::consume_stock))
        // Usage trail
        .route("/stock-usage", get(handlers::list_stock_usage))
        // Catalog
        .route(
            "/materials",
            get(handlers::list_materials).post(handlers::create_material),
        )
        .route("/materials/:id", delete(handlers::delete_material))
        .route(
            "/warehouses",
            get(handlers::list_warehouses).post(handlers::create_warehouse),
        )
        .route("/warehouses/:id", delete(handlers::delete_warehouse))
        .route(
            "/vendors",
            get(handlers::list_vendors).post(handlers::create_vendor),
        )
        .route("/vendors/:id", delete(handlers::delete_vendor))
        .route(
            "/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/customers/:id", delete(handlers::delete_customer))
        // Vendor orders
        .route(
            "/vendor-order",
            get(handlers::list_vendor_orders).post(handlers::create_vendor_order),
        )
        .route(
            "/vendor-order/:id",
            get(handlers::get_vendor_order)
                .put(handlers::update_vendor_order)
                .delete(handlers::delete_vendor_order),
        )
        .route("/vendor-order/approval/:id", get(handlers::approve_vendor_order))
        .route("/vendor-order/:id/receive", post(handlers::receive_vendor_order))
        .route("/vendor-order/:id/cancel", post(handlers::cancel_vendor_order))
        // Customer orders
        .route(
            "/customer-order",
            get(handlers::list_customer_orders).post(handlers::create_customer_order),
        )
        .route(
            "/customer-order/:id",
            get(handlers::get_customer_order)
                .put(handlers::update_customer_order)
                .delete(handlers::delete_customer_order),
        )
        .route(
            "/customer-order/approval/:id",
            get(handlers::confirm_customer_order),
        )
        .route(
            "/customer-order/:id/deliver",
            post(handlers::deliver_customer_order),
        )
        .route(
            "/customer-order/:id/cancel",
            post(handlers::cancel_customer_order),
        )
        // Warehouse transfer orders
        .route(
            "/warehouse-order",
            get(handlers::list_warehouse_orders).post(handlers::create_warehouse_order),
        )
        .route(
            "/warehouse-order/:id",
            get(handlers::get_warehouse_order)
                .put(handlers::update_warehouse_order)
                .delete(handlers::delete_warehouse_order),
        )
        .route(
            "/warehouse-order/approval/:id",
            get(handlers::approve_warehouse_order),
        )
        .route(
            "/warehouse-order/:id/receive",
            post(handlers::receive_warehouse_order),
        )
        .route(
            "/warehouse-order/:id/cancel",
            post(handlers::cancel_warehouse_order),
        )
        // Reports
        .route("/report/current-stock", get(handlers::current_stock_report))
        .route("/report/purchase", get(handlers::purchase_report))
        .route("/report/sales", get(handlers::sales_report))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Finance routes (protected)
fn finance_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route(
            "/account",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/account/:id", delete(handlers::delete_account))
        // Payments
        .route(
            "/payment",
            get(handlers::list_payments).post(handlers::create_payment),
        )
        .route(
            "/payment/:id",
            get(handlers::get_payment)
                .put(handlers::update_payment)
                .delete(handlers::delete_payment),
        )
        // Invoices
        .route(
            "/invoice",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route(
            "/invoice/:id",
            get(handlers::get_invoice)
                .put(handlers::update_invoice)
                .delete(handlers::delete_invoice),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
