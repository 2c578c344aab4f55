//! HTTP handlers for catalog endpoints (materials, warehouses, vendors,
//! customers)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{
    CatalogService, CreateMaterialInput, CreatePartyInput, CreateWarehouseInput,
};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::{Customer, Material, Vendor, Warehouse};

/// Create a material
pub async fn create_material(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMaterialInput>,
) -> AppResult<Json<ApiResponse<Material>>> {
    let service = CatalogService::new(state.db);
    let material = service
        .create_material(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::ok(material)))
}

/// List materials
pub async fn list_materials(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Material>>>> {
    let service = CatalogService::new(state.db);
    let (materials, pagination) = service.list_materials(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(materials, pagination)))
}

/// Soft-delete a material
pub async fn delete_material(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = CatalogService::new(state.db);
    service
        .remove_material(current_user.0.org_id, &current_user.0.actor(), material_id)
        .await?;
    Ok(Json(ApiResponse::message_only("Material deleted")))
}

/// Create a warehouse
pub async fn create_warehouse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateWarehouseInput>,
) -> AppResult<Json<ApiResponse<Warehouse>>> {
    let service = CatalogService::new(state.db);
    let warehouse = service
        .create_warehouse(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::ok(warehouse)))
}

/// List warehouses
pub async fn list_warehouses(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Warehouse>>>> {
    let service = CatalogService::new(state.db);
    let (warehouses, pagination) = service.list_warehouses(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(warehouses, pagination)))
}

/// Soft-delete a warehouse
pub async fn delete_warehouse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = CatalogService::new(state.db);
    service
        .remove_warehouse(current_user.0.org_id, &current_user.0.actor(), warehouse_id)
        .await?;
    Ok(Json(ApiResponse::message_only("Warehouse deleted")))
}

/// Create a vendor
pub async fn create_vendor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePartyInput>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let service = CatalogService::new(state.db);
    let vendor = service
        .create_vendor(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::ok(vendor)))
}

/// List vendors
pub async fn list_vendors(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Vendor>>>> {
    let service = CatalogService::new(state.db);
    let (vendors, pagination) = service.list_vendors(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(vendors, pagination)))
}

/// Soft-delete a vendor
pub async fn delete_vendor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(vendor_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = CatalogService::new(state.db);
    service
        .remove_vendor(current_user.0.org_id, &current_user.0.actor(), vendor_id)
        .await?;
    Ok(Json(ApiResponse::message_only("Vendor deleted")))
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePartyInput>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let service = CatalogService::new(state.db);
    let customer = service
        .create_customer(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::ok(customer)))
}

/// List customers
pub async fn list_customers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Customer>>>> {
    let service = CatalogService::new(state.db);
    let (customers, pagination) = service.list_customers(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(customers, pagination)))
}

/// Soft-delete a customer
pub async fn delete_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = CatalogService::new(state.db);
    service
        .remove_customer(current_user.0.org_id, &current_user.0.actor(), customer_id)
        .await?;
    Ok(Json(ApiResponse::message_only("Customer deleted")))
}
