//! HTTP handlers for customer order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::customer_order::{
    CreateCustomerOrderInput, CustomerOrderService, UpdateCustomerOrderInput,
};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::CustomerOrder;

/// Create a customer order
pub async fn create_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCustomerOrderInput>,
) -> AppResult<Json<ApiResponse<CustomerOrder>>> {
    let service = CustomerOrderService::new(state.db);
    let order = service
        .create(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Customer order created successfully",
    )))
}

/// List customer orders
pub async fn list_customer_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<CustomerOrder>>>> {
    let service = CustomerOrderService::new(state.db);
    let (orders, pagination) = service.list(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(orders, pagination)))
}

/// Get one customer order
pub async fn get_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerOrder>>> {
    let service = CustomerOrderService::new(state.db);
    let order = service.get(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Update a customer order
pub async fn update_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerOrderInput>,
) -> AppResult<Json<ApiResponse<CustomerOrder>>> {
    let service = CustomerOrderService::new(state.db);
    let order = service
        .update(current_user.0.org_id, order_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Customer order updated successfully",
    )))
}

/// Confirm a pending customer order
pub async fn confirm_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerOrder>>> {
    let service = CustomerOrderService::new(state.db);
    let order = service.confirm(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order confirmed successfully",
    )))
}

/// Cancel a pending customer order
pub async fn cancel_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerOrder>>> {
    let service = CustomerOrderService::new(state.db);
    let order = service.cancel(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order cancelled successfully",
    )))
}

/// Deliver a confirmed customer order, debiting stock
pub async fn deliver_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerOrder>>> {
    let service = CustomerOrderService::new(state.db);
    let order = service
        .deliver(current_user.0.org_id, &current_user.0.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order delivered successfully and stock updated",
    )))
}

/// Soft-delete a customer order
pub async fn delete_customer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = CustomerOrderService::new(state.db);
    service
        .remove(current_user.0.org_id, &current_user.0.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::message_only(
        "Customer order deleted successfully",
    )))
}
