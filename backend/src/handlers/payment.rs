//! HTTP handlers for payment endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::payment::{CreatePaymentInput, PaymentService, UpdatePaymentInput};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::Payment;

/// Record a payment
pub async fn create_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePaymentInput>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let service = PaymentService::new(state.db);
    let payment = service
        .create(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        payment,
        "Payment recorded successfully",
    )))
}

/// List payments
pub async fn list_payments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Payment>>>> {
    let service = PaymentService::new(state.db);
    let (payments, pagination) = service.list(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(payments, pagination)))
}

/// Get one payment
pub async fn get_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let service = PaymentService::new(state.db);
    let payment = service.get(current_user.0.org_id, payment_id).await?;
    Ok(Json(ApiResponse::ok(payment)))
}

/// Edit a payment, reversing and reapplying its impact
pub async fn update_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(payment_id): Path<Uuid>,
    Json(input): Json<UpdatePaymentInput>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let service = PaymentService::new(state.db);
    let payment = service
        .update(current_user.0.org_id, payment_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(
        payment,
        "Payment updated successfully",
    )))
}

/// Remove a payment, reversing its impact
pub async fn delete_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = PaymentService::new(state.db);
    service
        .remove(current_user.0.org_id, &current_user.0.actor(), payment_id)
        .await?;
    Ok(Json(ApiResponse::message_only(
        "Payment deleted successfully",
    )))
}
