//! HTTP handlers for vendor order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::vendor_order::{
    CreateVendorOrderInput, UpdateVendorOrderInput, VendorOrderService,
};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::VendorOrder;

/// Create a vendor order
pub async fn create_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateVendorOrderInput>,
) -> AppResult<Json<ApiResponse<VendorOrder>>> {
    let service = VendorOrderService::new(state.db);
    let order = service
        .create(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Vendor order created successfully",
    )))
}

/// List vendor orders
pub async fn list_vendor_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<VendorOrder>>>> {
    let service = VendorOrderService::new(state.db);
    let (orders, pagination) = service.list(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(orders, pagination)))
}

/// Get one vendor order
pub async fn get_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VendorOrder>>> {
    let service = VendorOrderService::new(state.db);
    let order = service.get(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Update a vendor order
pub async fn update_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateVendorOrderInput>,
) -> AppResult<Json<ApiResponse<VendorOrder>>> {
    let service = VendorOrderService::new(state.db);
    let order = service
        .update(current_user.0.org_id, order_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Vendor order updated successfully",
    )))
}

/// Approve a pending vendor order
pub async fn approve_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VendorOrder>>> {
    let service = VendorOrderService::new(state.db);
    let order = service.approve(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order approved successfully",
    )))
}

/// Cancel a pending vendor order
pub async fn cancel_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VendorOrder>>> {
    let service = VendorOrderService::new(state.db);
    let order = service.cancel(current_user.0.org_id, order_id).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order cancelled successfully",
    )))
}

/// Receive an approved vendor order, crediting stock
pub async fn receive_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VendorOrder>>> {
    let service = VendorOrderService::new(state.db);
    let order = service
        .receive(current_user.0.org_id, &current_user.0.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order received successfully and stock updated",
    )))
}

/// Soft-delete a vendor order
pub async fn delete_vendor_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = VendorOrderService::new(state.db);
    service
        .remove(current_user.0.org_id, &current_user.0.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::message_only(
        "Vendor order deleted successfully",
    )))
}
