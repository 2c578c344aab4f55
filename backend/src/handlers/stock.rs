//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{StockMoveInput, StockService, UsageFilter};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::{MaterialStock, StockUsageEntry};

/// Credit stock for a material in a warehouse
pub async fn stock_in(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockMoveInput>,
) -> AppResult<Json<ApiResponse<MaterialStock>>> {
    let service = StockService::new(state.db);
    let stock = service
        .stock_in(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(stock, "Stock added successfully")))
}

/// Reserve available stock
pub async fn reserve_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockMoveInput>,
) -> AppResult<Json<ApiResponse<MaterialStock>>> {
    let service = StockService::new(state.db);
    let stock = service.reserve(current_user.0.org_id, input).await?;
    Ok(Json(ApiResponse::with_message(stock, "Stock reserved successfully")))
}

/// Release reserved stock back to available
pub async fn release_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockMoveInput>,
) -> AppResult<Json<ApiResponse<MaterialStock>>> {
    let service = StockService::new(state.db);
    let stock = service.release(current_user.0.org_id, input).await?;
    Ok(Json(ApiResponse::with_message(stock, "Stock released successfully")))
}

/// Consume reserved stock
pub async fn consume_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockMoveInput>,
) -> AppResult<Json<ApiResponse<MaterialStock>>> {
    let service = StockService::new(state.db);
    let stock = service
        .consume(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::with_message(stock, "Stock consumed successfully")))
}

/// List stock records for the organization
pub async fn list_stocks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<MaterialStock>>>> {
    let service = StockService::new(state.db);
    let (stocks, pagination) = service.list(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(stocks, pagination)))
}

/// List the stock usage trail
pub async fn list_stock_usage(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<UsageFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<StockUsageEntry>>>> {
    let service = StockService::new(state.db);
    let (entries, pagination) = service
        .list_usage(current_user.0.org_id, &filter, &page)
        .await?;
    Ok(Json(ApiResponse::paginated(entries, pagination)))
}
