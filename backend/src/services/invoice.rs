//! Invoice management service
//!
//! Totals and due amounts are recomputed on every create/update; an invoice
//! with payments applied is locked against edits and deletion.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::sequence;
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{validate_money, Invoice, InvoiceKind, PartyReference, PaymentStatus};

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
}

/// Database row for an invoice
#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    org_id: Uuid,
    kind: String,
    reference_type: String,
    reference_id: Uuid,
    order_id: Option<Uuid>,
    invoice_number: String,
    invoice_date: NaiveDate,
    amount: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    paid_amount: Decimal,
    due_amount: Decimal,
    payment_status: String,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self) -> AppResult<Invoice> {
        let kind = InvoiceKind::parse(&self.kind)
            .ok_or_else(|| AppError::Internal(format!("unknown invoice kind: {}", self.kind)))?;
        let party =
            PartyReference::from_parts(&self.reference_type, self.reference_id).ok_or_else(|| {
                AppError::Internal(format!("unknown reference type: {}", self.reference_type))
            })?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            AppError::Internal(format!("unknown payment status: {}", self.payment_status))
        })?;
        Ok(Invoice {
            id: self.id,
            org_id: self.org_id,
            kind,
            party,
            order_id: self.order_id,
            invoice_number: self.invoice_number,
            invoice_date: self.invoice_date,
            amount: self.amount,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            due_amount: self.due_amount,
            payment_status,
            is_deleted: self.is_deleted,
            created_by: self.created_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const INVOICE_COLUMNS: &str = "id, org_id, kind, reference_type, reference_id, order_id, \
                               invoice_number, invoice_date, amount, tax_amount, total_amount, \
                               paid_amount, due_amount, payment_status, is_deleted, created_by, \
                               created_at, updated_at";

/// Input for creating an invoice
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceInput {
    pub kind: InvoiceKind,
    #[serde(flatten)]
    pub party: PartyReference,
    pub order_id: Option<Uuid>,
    /// Client-supplied invoice number; auto-sequenced when absent
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub tax_amount: Option<Decimal>,
}

/// Input for updating an unlocked invoice
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceInput {
    pub invoice_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub order_id: Option<Uuid>,
}

/// Optional kind filter for listings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub kind: Option<InvoiceKind>,
}

impl InvoiceService {
    /// Create a new InvoiceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an invoice in UNPAID status
    pub async fn create(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateInvoiceInput,
    ) -> AppResult<Invoice> {
        validate_money(input.amount).map_err(|m| AppError::validation("amount", m))?;
        let tax_amount = input.tax_amount.unwrap_or(Decimal::ZERO);
        validate_money(tax_amount).map_err(|m| AppError::validation("taxAmount", m))?;

        let total_amount = input.amount + tax_amount;
        let invoice_date = input.invoice_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        let invoice_number = match input.invoice_number {
            Some(number) => {
                let number = number.trim().to_string();
                if number.is_empty() {
                    return Err(AppError::validation(
                        "invoiceNumber",
                        "Invoice number cannot be empty",
                    ));
                }
                let duplicate = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM invoices WHERE org_id = $1 AND invoice_number = $2 AND is_deleted = FALSE)",
                )
                .bind(org_id)
                .bind(&number)
                .fetch_one(&mut *tx)
                .await?;

                if duplicate {
                    return Err(AppError::DuplicateEntry("invoice number".to_string()));
                }
                number
            }
            None => {
                sequence::next_document_number(&mut *tx, org_id, input.kind.number_prefix())
                    .await?
            }
        };

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices
                (org_id, kind, reference_type, reference_id, order_id, invoice_number,
                 invoice_date, amount, tax_amount, total_amount, paid_amount, due_amount,
                 payment_status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $10, 'UNPAID', $11)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(org_id)
        .bind(input.kind.as_str())
        .bind(input.party.kind())
        .bind(input.party.reference_id())
        .bind(input.order_id)
        .bind(&invoice_number)
        .bind(invoice_date)
        .bind(input.amount)
        .bind(tax_amount)
        .bind(total_amount)
        .bind(Json(actor))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_invoice()
    }

    /// Get one invoice
    pub async fn get(&self, org_id: Uuid, invoice_id: Uuid) -> AppResult<Invoice> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(invoice_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        row.into_invoice()
    }

    /// List invoices, newest first, optionally filtered by kind
    pub async fn list(
        &self,
        org_id: Uuid,
        filter: &InvoiceFilter,
        page: &PageQuery,
    ) -> AppResult<(Vec<Invoice>, PaginationMeta)> {
        let kind = filter.kind.map(|k| k.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM invoices
            WHERE org_id = $1 AND is_deleted = FALSE
              AND ($2::text IS NULL OR kind = $2)
            "#,
        )
        .bind(org_id)
        .bind(kind)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE org_id = $1 AND is_deleted = FALSE
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(org_id)
        .bind(kind)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let invoices = rows
            .into_iter()
            .map(InvoiceRow::into_invoice)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((invoices, PaginationMeta::new(total, page)))
    }

    /// Update an invoice that has no payments applied; totals and due are
    /// recomputed from the new amount/tax
    pub async fn update(
        &self,
        org_id: Uuid,
        invoice_id: Uuid,
        input: UpdateInvoiceInput,
    ) -> AppResult<Invoice> {
        let current = self.get(org_id, invoice_id).await?;
        if current.paid_amount > Decimal::ZERO {
            return Err(AppError::InvoiceLocked);
        }

        let amount = input.amount.unwrap_or(current.amount);
        validate_money(amount).map_err(|m| AppError::validation("amount", m))?;
        let tax_amount = input.tax_amount.unwrap_or(current.tax_amount);
        validate_money(tax_amount).map_err(|m| AppError::validation("taxAmount", m))?;
        let total_amount = amount + tax_amount;

        // Guarded on paid_amount so a payment racing this update loses
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            UPDATE invoices
            SET amount = $3,
                tax_amount = $4,
                total_amount = $5,
                due_amount = $5,
                invoice_date = COALESCE($6, invoice_date),
                order_id = COALESCE($7, order_id),
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND paid_amount = 0
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(invoice_id)
        .bind(org_id)
        .bind(amount)
        .bind(tax_amount)
        .bind(total_amount)
        .bind(input.invoice_date)
        .bind(input.order_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_invoice(),
            None => Err(AppError::InvoiceLocked),
        }
    }

    /// Soft-delete an invoice that has no payments applied
    pub async fn remove(&self, org_id: Uuid, actor: &AuditActor, invoice_id: Uuid) -> AppResult<()> {
        let deleted_by = actor.clone().stamped(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND paid_amount = 0
            "#,
        )
        .bind(invoice_id)
        .bind(org_id)
        .bind(Json(&deleted_by))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM invoices WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE)",
            )
            .bind(invoice_id)
            .bind(org_id)
            .fetch_one(&self.db)
            .await?;

            return Err(if exists {
                AppError::InvoiceLocked
            } else {
                AppError::NotFound("Invoice".to_string())
            });
        }

        Ok(())
    }
}
