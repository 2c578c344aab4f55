//! Account management service
//!
//! Accounts seed their current balance from the opening balance at creation;
//! afterwards only payment application and reversal move it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{validate_money, validate_name, Account, AccountType};

/// Account service
#[derive(Clone)]
pub struct AccountService {
    db: PgPool,
}

/// Database row for an account
#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    account_type: String,
    account_number: Option<String>,
    opening_balance: Decimal,
    current_balance: Decimal,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AppResult<Account> {
        let account_type = AccountType::parse(&self.account_type).ok_or_else(|| {
            AppError::Internal(format!("unknown account type: {}", self.account_type))
        })?;
        Ok(Account {
            id: self.id,
            org_id: self.org_id,
            name: self.name,
            account_type,
            account_number: self.account_number,
            opening_balance: self.opening_balance,
            current_balance: self.current_balance,
            is_deleted: self.is_deleted,
            created_by: self.created_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, org_id, name, account_type, account_number, opening_balance, \
                               current_balance, is_deleted, created_by, created_at, updated_at";

/// Input for creating an account
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInput {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub account_number: Option<String>,
    pub opening_balance: Option<Decimal>,
}

impl AccountService {
    /// Create a new AccountService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an account; the current balance starts at the opening balance
    pub async fn create(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateAccountInput,
    ) -> AppResult<Account> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;
        let opening_balance = input.opening_balance.unwrap_or(Decimal::ZERO);
        validate_money(opening_balance).map_err(|m| AppError::validation("openingBalance", m))?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE org_id = $1 AND name = $2 AND is_deleted = FALSE)",
        )
        .bind(org_id)
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry("account name".to_string()));
        }

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts
                (org_id, name, account_type, account_number, opening_balance, current_balance, created_by)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(org_id)
        .bind(input.name.trim())
        .bind(input.account_type.as_str())
        .bind(input.account_number.as_deref())
        .bind(opening_balance)
        .bind(Json(actor))
        .fetch_one(&self.db)
        .await?;

        row.into_account()
    }

    /// Get one account
    pub async fn get(&self, org_id: Uuid, account_id: Uuid) -> AppResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM accounts
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(account_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        row.into_account()
    }

    /// List accounts for the organization
    pub async fn list(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Account>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE org_id = $1 AND is_deleted = FALSE",
        )
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM accounts
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let accounts = rows
            .into_iter()
            .map(AccountRow::into_account)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((accounts, PaginationMeta::new(total, page)))
    }

    /// Soft-delete an account; rejected while the balance is non-zero
    pub async fn remove(&self, org_id: Uuid, actor: &AuditActor, account_id: Uuid) -> AppResult<()> {
        let deleted_by = actor.clone().stamped(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND current_balance = 0
            "#,
        )
        .bind(account_id)
        .bind(org_id)
        .bind(Json(&deleted_by))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE)",
            )
            .bind(account_id)
            .bind(org_id)
            .fetch_one(&self.db)
            .await?;

            return Err(if exists {
                AppError::State("Account with a non-zero balance cannot be deleted".to_string())
            } else {
                AppError::NotFound("Account".to_string())
            });
        }

        Ok(())
    }
}
