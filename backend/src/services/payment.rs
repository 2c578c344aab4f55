//! Payment application and reversal service
//!
//! A payment moves an account balance and, when linked, an invoice's
//! paid/due amounts. Update and removal first reverse the prior impact and
//! then apply the new one, all inside a single transaction, so no reader
//! ever observes a half-applied payment.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{
    validate_payment_amount, PartyReference, Payment, PaymentDirection, PaymentMode, PaymentStatus,
};

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

/// Database row for a payment
#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    org_id: Uuid,
    account_id: Uuid,
    reference_type: String,
    reference_id: Uuid,
    order_id: Option<Uuid>,
    invoice_id: Option<Uuid>,
    direction: String,
    amount: Decimal,
    payment_mode: String,
    payment_date: NaiveDate,
    remarks: Option<String>,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> AppResult<Payment> {
        let party =
            PartyReference::from_parts(&self.reference_type, self.reference_id).ok_or_else(|| {
                AppError::Internal(format!("unknown reference type: {}", self.reference_type))
            })?;
        let direction = PaymentDirection::parse(&self.direction).ok_or_else(|| {
            AppError::Internal(format!("unknown payment direction: {}", self.direction))
        })?;
        let payment_mode = PaymentMode::parse(&self.payment_mode).ok_or_else(|| {
            AppError::Internal(format!("unknown payment mode: {}", self.payment_mode))
        })?;
        Ok(Payment {
            id: self.id,
            org_id: self.org_id,
            account_id: self.account_id,
            party,
            order_id: self.order_id,
            invoice_id: self.invoice_id,
            direction,
            amount: self.amount,
            payment_mode,
            payment_date: self.payment_date,
            remarks: self.remarks,
            is_deleted: self.is_deleted,
            created_by: self.created_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, org_id, account_id, reference_type, reference_id, order_id, \
                               invoice_id, direction, amount, payment_mode, payment_date, remarks, \
                               is_deleted, created_by, created_at, updated_at";

/// Input for recording a payment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentInput {
    pub account_id: Uuid,
    #[serde(flatten)]
    pub party: PartyReference,
    pub order_id: Option<Uuid>,
    /// When present, the payment also settles this invoice
    pub invoice_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub direction: PaymentDirection,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

/// Input for editing a payment; direction and account are fixed at creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentInput {
    pub amount: Option<Decimal>,
    pub payment_mode: Option<PaymentMode>,
    pub payment_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a payment: clamp against the linked invoice's due amount,
    /// settle the invoice, and move the account balance, transactionally
    pub async fn create(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreatePaymentInput,
    ) -> AppResult<Payment> {
        validate_payment_amount(input.amount).map_err(|m| AppError::validation("amount", m))?;
        let payment_date = input.payment_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        lock_account(&mut tx, org_id, input.account_id).await?;

        // Clamp to the invoice due amount when an invoice is linked
        let payable = match input.invoice_id {
            Some(invoice_id) => {
                let (paid, due) = lock_invoice(&mut tx, org_id, invoice_id).await?;
                if due <= Decimal::ZERO {
                    return Err(AppError::State(
                        "Invoice is already fully paid".to_string(),
                    ));
                }
                let payable = input.amount.min(due);
                settle_invoice(&mut tx, invoice_id, paid + payable, due - payable).await?;
                payable
            }
            None => input.amount,
        };

        apply_balance(&mut tx, org_id, input.account_id, input.direction.signed(payable)).await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments
                (org_id, account_id, reference_type, reference_id, order_id, invoice_id,
                 direction, amount, payment_mode, payment_date, remarks, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(org_id)
        .bind(input.account_id)
        .bind(input.party.kind())
        .bind(input.party.reference_id())
        .bind(input.order_id)
        .bind(input.invoice_id)
        .bind(input.direction.as_str())
        .bind(payable)
        .bind(input.payment_mode.as_str())
        .bind(payment_date)
        .bind(input.remarks.as_deref().map(str::trim))
        .bind(Json(actor))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_payment()
    }

    /// Get one payment
    pub async fn get(&self, org_id: Uuid, payment_id: Uuid) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(payment_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

        row.into_payment()
    }

    /// List payments, newest first
    pub async fn list(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Payment>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payments WHERE org_id = $1 AND is_deleted = FALSE",
        )
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY payment_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let payments = rows
            .into_iter()
            .map(PaymentRow::into_payment)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((payments, PaginationMeta::new(total, page)))
    }

    /// Edit a payment: reverse the old balance and invoice impact, then
    /// apply the new one, in a single transaction
    pub async fn update(
        &self,
        org_id: Uuid,
        payment_id: Uuid,
        input: UpdatePaymentInput,
    ) -> AppResult<Payment> {
        let mut tx = self.db.begin().await?;

        let old = lock_payment(&mut tx, org_id, payment_id).await?;

        let new_amount = input.amount.unwrap_or(old.amount);
        validate_payment_amount(new_amount).map_err(|m| AppError::validation("amount", m))?;

        lock_account(&mut tx, org_id, old.account_id).await?;

        // Reverse the old impact
        apply_balance(&mut tx, org_id, old.account_id, -old.direction.signed(old.amount)).await?;

        // Apply the new impact, re-clamping against the reverted invoice
        let payable = match old.invoice_id {
            Some(invoice_id) => {
                let (paid, due) = lock_invoice(&mut tx, org_id, invoice_id).await?;
                let paid = paid - old.amount;
                let due = due + old.amount;
                let payable = new_amount.min(due);
                settle_invoice(&mut tx, invoice_id, paid + payable, due - payable).await?;
                payable
            }
            None => new_amount,
        };

        apply_balance(&mut tx, org_id, old.account_id, old.direction.signed(payable)).await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET amount = $3,
                payment_mode = COALESCE($4, payment_mode),
                payment_date = COALESCE($5, payment_date),
                remarks = COALESCE($6, remarks),
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(org_id)
        .bind(payable)
        .bind(input.payment_mode.map(|m| m.as_str()))
        .bind(input.payment_date)
        .bind(input.remarks.as_deref().map(str::trim))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_payment()
    }

    /// Remove a payment: reverse its balance and invoice impact and
    /// soft-delete it, transactionally
    pub async fn remove(&self, org_id: Uuid, actor: &AuditActor, payment_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let old = lock_payment(&mut tx, org_id, payment_id).await?;

        lock_account(&mut tx, org_id, old.account_id).await?;
        apply_balance(&mut tx, org_id, old.account_id, -old.direction.signed(old.amount)).await?;

        if let Some(invoice_id) = old.invoice_id {
            let (paid, due) = lock_invoice(&mut tx, org_id, invoice_id).await?;
            settle_invoice(&mut tx, invoice_id, paid - old.amount, due + old.amount).await?;
        }

        let deleted_by = actor.clone().stamped(Utc::now());
        sqlx::query(
            r#"
            UPDATE payments
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(payment_id)
        .bind(org_id)
        .bind(Json(&deleted_by))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Lock a payment row for the rest of the transaction
async fn lock_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    org_id: Uuid,
    payment_id: Uuid,
) -> AppResult<Payment> {
    let row = sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        SELECT {PAYMENT_COLUMNS}
        FROM payments
        WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
        FOR UPDATE
        "#
    ))
    .bind(payment_id)
    .bind(org_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

    row.into_payment()
}

/// Lock an account row for the rest of the transaction
async fn lock_account(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    org_id: Uuid,
    account_id: Uuid,
) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM accounts WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE FOR UPDATE",
    )
    .bind(account_id)
    .bind(org_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

    Ok(())
}

/// Lock an invoice row and return its (paid, due) amounts
async fn lock_invoice(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    org_id: Uuid,
    invoice_id: Uuid,
) -> AppResult<(Decimal, Decimal)> {
    sqlx::query_as::<_, (Decimal, Decimal)>(
        r#"
        SELECT paid_amount, due_amount
        FROM invoices
        WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
        FOR UPDATE
        "#,
    )
    .bind(invoice_id)
    .bind(org_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}

/// Write new paid/due amounts and the derived payment status
async fn settle_invoice(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    invoice_id: Uuid,
    paid_amount: Decimal,
    due_amount: Decimal,
) -> AppResult<()> {
    let status = PaymentStatus::derive(paid_amount, due_amount);
    sqlx::query(
        r#"
        UPDATE invoices
        SET paid_amount = $2, due_amount = $3, payment_status = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(invoice_id)
    .bind(paid_amount)
    .bind(due_amount)
    .bind(status.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Move an account balance by a signed delta
async fn apply_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    org_id: Uuid,
    account_id: Uuid,
    delta: Decimal,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET current_balance = current_balance + $3, updated_at = NOW()
        WHERE id = $1 AND org_id = $2
        "#,
    )
    .bind(account_id)
    .bind(org_id)
    .bind(delta)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
