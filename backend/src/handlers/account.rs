//! HTTP handlers for account endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::account::{AccountService, CreateAccountInput};
use crate::AppState;
use shared::types::{ApiResponse, PageQuery};
use shared::Account;

/// Create an account
pub async fn create_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAccountInput>,
) -> AppResult<Json<ApiResponse<Account>>> {
    let service = AccountService::new(state.db);
    let account = service
        .create(current_user.0.org_id, &current_user.0.actor(), input)
        .await?;
    Ok(Json(ApiResponse::ok(account)))
}

/// List accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Account>>>> {
    let service = AccountService::new(state.db);
    let (accounts, pagination) = service.list(current_user.0.org_id, &page).await?;
    Ok(Json(ApiResponse::paginated(accounts, pagination)))
}

/// Soft-delete an account with a zero balance
pub async fn delete_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = AccountService::new(state.db);
    service
        .remove(current_user.0.org_id, &current_user.0.actor(), account_id)
        .await?;
    Ok(Json(ApiResponse::message_only("Account deleted")))
}
