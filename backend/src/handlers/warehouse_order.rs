//! HTTP handlers for warehouse transfer order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::warehouse_order::{
    CreateTransferInput, UpdateTransferInput, WarehouseOrderService,
};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::WarehouseTransferOrder;

/// Create a warehouse transfer order
pub async fn create_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<Json<ApiResponse<WarehouseTransferOrder>>> {
    let service = WarehouseOrderService::new(state.db);
    let order = service
        .create(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Warehouse order created successfully",
    )))
}

/// List warehouse transfer orders
pub async fn list_warehouse_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<WarehouseTransferOrder>>>> {
    let service = WarehouseOrderService::new(state.db);
    let (orders, pagination) = service.list(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(orders, pagination)))
}

/// Get one warehouse transfer order
pub async fn get_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WarehouseTransferOrder>>> {
    let service = WarehouseOrderService::new(state.db);
    let order = service.get(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Update a pending warehouse transfer order
pub async fn update_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateTransferInput>,
) -> AppResult<Json<ApiResponse<WarehouseTransferOrder>>> {
    let service = WarehouseOrderService::new(state.db);
    let order = service
        .update(current_user.0.org_id, order_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Warehouse order updated successfully",
    )))
}

/// Approve a pending transfer, reserving stock at the source warehouse
pub async fn approve_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WarehouseTransferOrder>>> {
    let service = WarehouseOrderService::new(state.db);
    let order = service.approve(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order approved and stock reserved",
    )))
}

/// Cancel a pending transfer
pub async fn cancel_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WarehouseTransferOrder>>> {
    let service = WarehouseOrderService::new(state.db);
    let order = service.cancel(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order cancelled successfully",
    )))
}

/// Receive an approved transfer at the destination warehouse
pub async fn receive_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WarehouseTransferOrder>>> {
    let service = WarehouseOrderService::new(state.db);
    let order = service
        .receive(current_user.0.org_id, &current_user.0.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Transfer received and stock moved",
    )))
}

/// Soft-delete a pending transfer
pub async fn delete_warehouse_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = WarehouseOrderService::new(state.db);
    service
        .remove(current_user.0.org_id, &current_user.0.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::message_only(
        "Warehouse order deleted successfully",
    )))
}
