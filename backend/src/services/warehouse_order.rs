//! Warehouse transfer order workflow service
//!
//! PENDING -> APPROVED -> RECEIVING -> RECEIVED, or PENDING -> CANCELLED.
//! Approval reserves every item at the source warehouse; receive consumes
//! the reservation and credits the destination, completing the transfer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::vendor_order::ensure_warehouse_exists;
use crate::services::{sequence, stock};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{
    validate_distinct_warehouses, validate_quantity, StockDirection, StockReference,
    StockReferenceKind, TransferItem, TransferStatus, WarehouseTransferOrder,
};

/// Warehouse transfer order service
#[derive(Clone)]
pub struct WarehouseOrderService {
    db: PgPool,
}

/// Database row for a transfer order
#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    org_id: Uuid,
    from_warehouse_id: Uuid,
    to_warehouse_id: Uuid,
    order_number: String,
    order_date: NaiveDate,
    items: Json<Vec<TransferItem>>,
    status: String,
    remark: Option<String>,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransferRow {
    fn into_order(self) -> AppResult<WarehouseTransferOrder> {
        let status = TransferStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown order status: {}", self.status)))?;
        Ok(WarehouseTransferOrder {
            id: self.id,
            org_id: self.org_id,
            from_warehouse_id: self.from_warehouse_id,
            to_warehouse_id: self.to_warehouse_id,
            order_number: self.order_number,
            order_date: self.order_date,
            items: self.items.0,
            status,
            remark: self.remark,
            is_deleted: self.is_deleted,
            created_by: self.created_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, org_id, from_warehouse_id, to_warehouse_id, order_number, \
                             order_date, items, status, remark, is_deleted, created_by, \
                             created_at, updated_at";

/// One transfer line as submitted by the client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferItemInput {
    pub material_id: Uuid,
    pub quantity: Decimal,
}

/// Input for creating a transfer order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferInput {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub items: Vec<TransferItemInput>,
    pub order_date: Option<NaiveDate>,
    pub remark: Option<String>,
}

/// Input for updating a pending transfer order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransferInput {
    pub from_warehouse_id: Option<Uuid>,
    pub to_warehouse_id: Option<Uuid>,
    pub items: Option<Vec<TransferItemInput>>,
    pub order_date: Option<NaiveDate>,
    pub remark: Option<String>,
}

/// Validate submitted transfer lines
fn validate_transfer_items(items: &[TransferItemInput]) -> AppResult<Vec<TransferItem>> {
    if items.is_empty() {
        return Err(AppError::validation("items", "Order items are required"));
    }
    items
        .iter()
        .map(|item| {
            validate_quantity(item.quantity).map_err(|m| AppError::validation("items", m))?;
            Ok(TransferItem {
                material_id: item.material_id,
                quantity: item.quantity,
            })
        })
        .collect()
}

impl WarehouseOrderService {
    /// Create a new WarehouseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a transfer order in PENDING status
    pub async fn create(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateTransferInput,
    ) -> AppResult<WarehouseTransferOrder> {
        validate_distinct_warehouses(input.from_warehouse_id, input.to_warehouse_id)
            .map_err(|m| AppError::validation("toWarehouseId", m))?;
        let items = validate_transfer_items(&input.items)?;

        ensure_warehouse_exists(&self.db, org_id, input.from_warehouse_id).await?;
        ensure_warehouse_exists(&self.db, org_id, input.to_warehouse_id).await?;

        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;
        let order_number = sequence::next_document_number(&mut *tx, org_id, "TO").await?;

        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            INSERT INTO warehouse_orders
                (org_id, from_warehouse_id, to_warehouse_id, order_number, order_date,
                 items, status, remark, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', $7, $8)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(org_id)
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .bind(&order_number)
        .bind(order_date)
        .bind(Json(&items))
        .bind(input.remark.as_deref().map(str::trim))
        .bind(Json(actor))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_order()
    }

    /// Get one transfer order
    pub async fn get(&self, org_id: Uuid, order_id: Uuid) -> AppResult<WarehouseTransferOrder> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM warehouse_orders
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse order".to_string()))?;

        row.into_order()
    }

    /// List transfer orders, newest first
    pub async fn list(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<WarehouseTransferOrder>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warehouse_orders WHERE org_id = $1 AND is_deleted = FALSE",
        )
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM warehouse_orders
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let orders = rows
            .into_iter()
            .map(TransferRow::into_order)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, PaginationMeta::new(total, page)))
    }

    /// Update a transfer while it is still PENDING
    pub async fn update(
        &self,
        org_id: Uuid,
        order_id: Uuid,
        input: UpdateTransferInput,
    ) -> AppResult<WarehouseTransferOrder> {
        if let (Some(from), Some(to)) = (input.from_warehouse_id, input.to_warehouse_id) {
            validate_distinct_warehouses(from, to)
                .map_err(|m| AppError::validation("toWarehouseId", m))?;
        }

        let items = match &input.items {
            Some(items) => Some(validate_transfer_items(items)?),
            None => None,
        };

        if let Some(warehouse_id) = input.from_warehouse_id {
            ensure_warehouse_exists(&self.db, org_id, warehouse_id).await?;
        }
        if let Some(warehouse_id) = input.to_warehouse_id {
            ensure_warehouse_exists(&self.db, org_id, warehouse_id).await?;
        }

        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE warehouse_orders
            SET from_warehouse_id = COALESCE($3, from_warehouse_id),
                to_warehouse_id = COALESCE($4, to_warehouse_id),
                order_date = COALESCE($5, order_date),
                items = COALESCE($6, items),
                remark = COALESCE($7, remark),
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status = 'PENDING'
              AND COALESCE($3, from_warehouse_id) <> COALESCE($4, to_warehouse_id)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .bind(input.order_date)
        .bind(items.as_ref().map(Json))
        .bind(input.remark.as_deref().map(str::trim))
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_order(),
            None => Err(self.missing_or_state(org_id, order_id, "updated").await?),
        }
    }

    /// Approve a pending transfer, reserving every item at the source
    /// warehouse. Any shortfall rolls the whole approval back.
    pub async fn approve(
        &self,
        org_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<WarehouseTransferOrder> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE warehouse_orders
            SET status = 'APPROVED', updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status = 'PENDING'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            drop(tx);
            return Err(self.missing_or_state(org_id, order_id, "approved").await?);
        };
        let order = row.into_order()?;

        for item in &order.items {
            stock::reserve(
                &mut *tx,
                org_id,
                item.material_id,
                order.from_warehouse_id,
                item.quantity,
                StockReferenceKind::WarehouseTransfer,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    /// Cancel a pending transfer
    pub async fn cancel(&self, org_id: Uuid, order_id: Uuid) -> AppResult<WarehouseTransferOrder> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE warehouse_orders
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status = 'PENDING'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_order(),
            None => Err(self.missing_or_state(org_id, order_id, "cancelled").await?),
        }
    }

    /// Receive an approved transfer: consume the source reservation and
    /// credit the destination warehouse for every item, with OUT/IN usage
    /// entries, all inside one transaction.
    pub async fn receive(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        order_id: Uuid,
    ) -> AppResult<WarehouseTransferOrder> {
        let mut tx = self.db.begin().await?;

        // Transient lock: only one caller can move APPROVED -> RECEIVING
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE warehouse_orders
            SET status = 'RECEIVING', updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status = 'APPROVED'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            drop(tx);
            return Err(self.missing_or_state(org_id, order_id, "received").await?);
        };
        let order = row.into_order()?;

        let remark = order
            .remark
            .clone()
            .unwrap_or_else(|| "Warehouse transfer received".to_string());
        for item in &order.items {
            stock::consume(
                &mut *tx,
                org_id,
                item.material_id,
                order.from_warehouse_id,
                item.quantity,
                StockReferenceKind::WarehouseTransfer,
            )
            .await?;

            stock::append_usage(
                &mut *tx,
                org_id,
                item.material_id,
                order.from_warehouse_id,
                item.quantity,
                StockDirection::Out,
                StockReference::WarehouseTransfer(order.id),
                Some(&remark),
                actor,
            )
            .await?;

            stock::stock_in(
                &mut *tx,
                org_id,
                item.material_id,
                order.to_warehouse_id,
                item.quantity,
                StockReferenceKind::WarehouseTransfer,
                actor,
            )
            .await?;

            stock::append_usage(
                &mut *tx,
                org_id,
                item.material_id,
                order.to_warehouse_id,
                item.quantity,
                StockDirection::In,
                StockReference::WarehouseTransfer(order.id),
                Some(&remark),
                actor,
            )
            .await?;
        }

        // Finalize within the same transaction
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE warehouse_orders
            SET status = 'RECEIVED', updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND status = 'RECEIVING'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_order()
    }

    /// Soft-delete a transfer while it is still PENDING
    pub async fn remove(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        order_id: Uuid,
    ) -> AppResult<()> {
        let deleted_by = actor.clone().stamped(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE warehouse_orders
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status = 'PENDING'
            "#,
        )
        .bind(order_id)
        .bind(org_id)
        .bind(Json(&deleted_by))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_state(org_id, order_id, "deleted").await?);
        }

        Ok(())
    }

    /// Distinguish "gone" from "precondition failed" after a guarded update
    /// matched no row
    async fn missing_or_state(
        &self,
        org_id: Uuid,
        order_id: Uuid,
        action: &str,
    ) -> AppResult<AppError> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM warehouse_orders WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE",
        )
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(match status {
            Some(status) => AppError::State(format!(
                "Order in status {} cannot be {}",
                status, action
            )),
            None => AppError::NotFound("Warehouse order".to_string()),
        })
    }
}
