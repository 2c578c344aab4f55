//! Stock ledger service
//!
//! Tracks available/reserved quantities per (material, warehouse) and the
//! append-only usage trail. Every guarded mutation is a single conditional
//! statement; the precondition and the write can never be split by a
//! concurrent request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{
    validate_quantity, MaterialStock, StockDirection, StockReference, StockReferenceKind,
    StockUsageEntry,
};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Database row for a stock record
#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    available_qty: Decimal,
    reserved_qty: Decimal,
    reference_type: Option<String>,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockRow {
    fn into_stock(self) -> AppResult<MaterialStock> {
        let reference_type = match self.reference_type {
            Some(ref s) => Some(
                StockReferenceKind::parse(s)
                    .ok_or_else(|| AppError::Internal(format!("unknown reference type: {}", s)))?,
            ),
            None => None,
        };
        Ok(MaterialStock {
            id: self.id,
            org_id: self.org_id,
            material_id: self.material_id,
            warehouse_id: self.warehouse_id,
            available_qty: self.available_qty,
            reserved_qty: self.reserved_qty,
            reference_type,
            created_by: self.created_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row for a usage entry
#[derive(Debug, FromRow)]
struct UsageRow {
    id: Uuid,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    direction: String,
    reference_type: String,
    reference_id: Option<Uuid>,
    remark: Option<String>,
    created_by: Json<AuditActor>,
    created_at: DateTime<Utc>,
}

impl UsageRow {
    fn into_entry(self) -> AppResult<StockUsageEntry> {
        let direction = StockDirection::parse(&self.direction)
            .ok_or_else(|| AppError::Internal(format!("unknown direction: {}", self.direction)))?;
        let kind = StockReferenceKind::parse(&self.reference_type).ok_or_else(|| {
            AppError::Internal(format!("unknown reference type: {}", self.reference_type))
        })?;
        let reference = StockReference::from_parts(kind, self.reference_id).ok_or_else(|| {
            AppError::Internal("reference id does not match reference type".to_string())
        })?;
        Ok(StockUsageEntry {
            id: self.id,
            org_id: self.org_id,
            material_id: self.material_id,
            warehouse_id: self.warehouse_id,
            quantity: self.quantity,
            direction,
            reference,
            remark: self.remark,
            created_by: self.created_by.0,
            created_at: self.created_at,
        })
    }
}

/// Input for a single stock movement
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMoveInput {
    pub material_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub remark: Option<String>,
}

/// Filters for the usage trail listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageFilter {
    pub material_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

// ============================================================================
// Ledger primitives
//
// These run on a caller-supplied connection so order workflows can invoke
// them inside their own transactions. Guards live in the WHERE clause: a
// statement that matches no row means the precondition failed.
// ============================================================================

/// Credit available stock, creating the record on first stock-in
pub(crate) async fn stock_in(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    reference: StockReferenceKind,
    actor: &AuditActor,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO material_stocks
            (org_id, material_id, warehouse_id, available_qty, reserved_qty, reference_type, created_by)
        VALUES ($1, $2, $3, $4, 0, $5, $6)
        ON CONFLICT (org_id, material_id, warehouse_id)
        DO UPDATE SET available_qty = material_stocks.available_qty + EXCLUDED.available_qty,
                      reference_type = EXCLUDED.reference_type,
                      updated_at = NOW()
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(reference.as_str())
    .bind(Json(actor))
    .execute(conn)
    .await?;

    Ok(())
}

/// Move quantity from available to reserved
pub(crate) async fn reserve(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    reference: StockReferenceKind,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE material_stocks
        SET available_qty = available_qty - $4,
            reserved_qty = reserved_qty + $4,
            reference_type = $5,
            updated_at = NOW()
        WHERE org_id = $1 AND material_id = $2 AND warehouse_id = $3
          AND is_deleted = FALSE
          AND available_qty >= $4
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(reference.as_str())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InsufficientStock(format!(
            "material {} in warehouse {}",
            material_id, warehouse_id
        )));
    }

    Ok(())
}

/// Move quantity from reserved back to available
pub(crate) async fn release(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    reference: StockReferenceKind,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE material_stocks
        SET available_qty = available_qty + $4,
            reserved_qty = reserved_qty - $4,
            reference_type = $5,
            updated_at = NOW()
        WHERE org_id = $1 AND material_id = $2 AND warehouse_id = $3
          AND is_deleted = FALSE
          AND reserved_qty >= $4
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(reference.as_str())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InsufficientReserved(format!(
            "material {} in warehouse {}",
            material_id, warehouse_id
        )));
    }

    Ok(())
}

/// Remove reserved quantity from the system
pub(crate) async fn consume(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    reference: StockReferenceKind,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE material_stocks
        SET reserved_qty = reserved_qty - $4,
            reference_type = $5,
            updated_at = NOW()
        WHERE org_id = $1 AND material_id = $2 AND warehouse_id = $3
          AND is_deleted = FALSE
          AND reserved_qty >= $4
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(reference.as_str())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InsufficientReserved(format!(
            "material {} in warehouse {}",
            material_id, warehouse_id
        )));
    }

    Ok(())
}

/// Debit available stock directly (order delivery)
pub(crate) async fn stock_out(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    reference: StockReferenceKind,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE material_stocks
        SET available_qty = available_qty - $4,
            reference_type = $5,
            updated_at = NOW()
        WHERE org_id = $1 AND material_id = $2 AND warehouse_id = $3
          AND is_deleted = FALSE
          AND available_qty >= $4
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(reference.as_str())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InsufficientStock(format!(
            "material {} in warehouse {}",
            material_id, warehouse_id
        )));
    }

    Ok(())
}

/// Append an entry to the usage trail. Entries record net IN/OUT movements;
/// reserve/release shifts do not appear here.
pub(crate) async fn append_usage(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    direction: StockDirection,
    reference: StockReference,
    remark: Option<&str>,
    actor: &AuditActor,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_usage_entries
            (org_id, material_id, warehouse_id, quantity, direction, reference_type, reference_id, remark, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(direction.as_str())
    .bind(reference.kind().as_str())
    .bind(reference.reference_id())
    .bind(remark)
    .bind(Json(actor))
    .execute(conn)
    .await?;

    Ok(())
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Credit stock via the HTTP surface (manual adjustment)
    pub async fn stock_in(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: StockMoveInput,
    ) -> AppResult<MaterialStock> {
        validate_quantity(input.quantity).map_err(|m| AppError::validation("quantity", m))?;

        let mut tx = self.db.begin().await?;

        stock_in(
            &mut *tx,
            org_id,
            input.material_id,
            input.warehouse_id,
            input.quantity,
            StockReferenceKind::Adjustment,
            actor,
        )
        .await?;

        append_usage(
            &mut *tx,
            org_id,
            input.material_id,
            input.warehouse_id,
            input.quantity,
            StockDirection::In,
            StockReference::Adjustment,
            input.remark.as_deref(),
            actor,
        )
        .await?;

        let stock = fetch_stock(&mut *tx, org_id, input.material_id, input.warehouse_id).await?;
        tx.commit().await?;

        Ok(stock)
    }

    /// Reserve available stock (no net movement, no usage entry)
    pub async fn reserve(
        &self,
        org_id: Uuid,
        input: StockMoveInput,
    ) -> AppResult<MaterialStock> {
        validate_quantity(input.quantity).map_err(|m| AppError::validation("quantity", m))?;

        let mut tx = self.db.begin().await?;
        reserve(
            &mut *tx,
            org_id,
            input.material_id,
            input.warehouse_id,
            input.quantity,
            StockReferenceKind::Adjustment,
        )
        .await?;
        let stock = fetch_stock(&mut *tx, org_id, input.material_id, input.warehouse_id).await?;
        tx.commit().await?;

        Ok(stock)
    }

    /// Return reserved stock to available
    pub async fn release(
        &self,
        org_id: Uuid,
        input: StockMoveInput,
    ) -> AppResult<MaterialStock> {
        validate_quantity(input.quantity).map_err(|m| AppError::validation("quantity", m))?;

        let mut tx = self.db.begin().await?;
        release(
            &mut *tx,
            org_id,
            input.material_id,
            input.warehouse_id,
            input.quantity,
            StockReferenceKind::Adjustment,
        )
        .await?;
        let stock = fetch_stock(&mut *tx, org_id, input.material_id, input.warehouse_id).await?;
        tx.commit().await?;

        Ok(stock)
    }

    /// Consume reserved stock; the quantity leaves the system
    pub async fn consume(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: StockMoveInput,
    ) -> AppResult<MaterialStock> {
        validate_quantity(input.quantity).map_err(|m| AppError::validation("quantity", m))?;

        let mut tx = self.db.begin().await?;
        consume(
            &mut *tx,
            org_id,
            input.material_id,
            input.warehouse_id,
            input.quantity,
            StockReferenceKind::Adjustment,
        )
        .await?;
        append_usage(
            &mut *tx,
            org_id,
            input.material_id,
            input.warehouse_id,
            input.quantity,
            StockDirection::Out,
            StockReference::Adjustment,
            input.remark.as_deref(),
            actor,
        )
        .await?;
        let stock = fetch_stock(&mut *tx, org_id, input.material_id, input.warehouse_id).await?;
        tx.commit().await?;

        Ok(stock)
    }

    /// List stock records for the organization
    pub async fn list(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<MaterialStock>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM material_stocks WHERE org_id = $1 AND is_deleted = FALSE",
        )
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT id, org_id, material_id, warehouse_id, available_qty, reserved_qty,
                   reference_type, created_by, created_at, updated_at
            FROM material_stocks
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let stocks = rows
            .into_iter()
            .map(StockRow::into_stock)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((stocks, PaginationMeta::new(total, page)))
    }

    /// List the usage trail, optionally filtered by material or warehouse
    pub async fn list_usage(
        &self,
        org_id: Uuid,
        filter: &UsageFilter,
        page: &PageQuery,
    ) -> AppResult<(Vec<StockUsageEntry>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM stock_usage_entries
            WHERE org_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::uuid IS NULL OR warehouse_id = $3)
            "#,
        )
        .bind(org_id)
        .bind(filter.material_id)
        .bind(filter.warehouse_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, UsageRow>(
            r#"
            SELECT id, org_id, material_id, warehouse_id, quantity, direction,
                   reference_type, reference_id, remark, created_by, created_at
            FROM stock_usage_entries
            WHERE org_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::uuid IS NULL OR warehouse_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(org_id)
        .bind(filter.material_id)
        .bind(filter.warehouse_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(UsageRow::into_entry)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((entries, PaginationMeta::new(total, page)))
    }
}

/// Fetch one stock record inside an open transaction
async fn fetch_stock(
    conn: &mut PgConnection,
    org_id: Uuid,
    material_id: Uuid,
    warehouse_id: Uuid,
) -> AppResult<MaterialStock> {
    let row = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT id, org_id, material_id, warehouse_id, available_qty, reserved_qty,
               reference_type, created_by, created_at, updated_at
        FROM material_stocks
        WHERE org_id = $1 AND material_id = $2 AND warehouse_id = $3 AND is_deleted = FALSE
        "#,
    )
    .bind(org_id)
    .bind(material_id)
    .bind(warehouse_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Stock record".to_string()))?;

    row.into_stock()
}
