//! HTTP handlers for invoice endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::invoice::{
    CreateInvoiceInput, InvoiceFilter, InvoiceService, UpdateInvoiceInput,
};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::Invoice;

/// Create an invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let service = InvoiceService::new(state.db);
    let invoice = service
        .create(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        invoice,
        "Invoice created successfully",
    )))
}

/// List invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<InvoiceFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Invoice>>>> {
    let service = InvoiceService::new(state.db);
    let (invoices, pagination) = service
        .list(current_user.0.org_id, &filter, &page)
        .await?;
    Ok(Json(ApiResponse::paginated(invoices, pagination)))
}

/// Get one invoice
pub async fn get_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let service = InvoiceService::new(state.db);
    let invoice = service.get(current_user.0.org_id, invoice_id).await?;
    Ok(Json(ApiResponse::ok(invoice)))
}

/// Update an invoice with no payments applied
pub async fn update_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<UpdateInvoiceInput>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let service = InvoiceService::new(state.db);
    let invoice = service
        .update(current_user.0.org_id, invoice_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        invoice,
        "Invoice updated successfully",
    )))
}

/// Soft-delete an invoice with no payments applied
pub async fn delete_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = InvoiceService::new(state.db);
    service
        .remove(current_user.0.org_id, &current_user.0.actor(), invoice_id)
        .await?;
    Ok(Json(ApiResponse::message_only(
        "Invoice deleted successfully",
    )))
}
