//! Vendor (purchase) order workflow service
//!
//! PENDING -> APPROVED -> RECEIVING -> RECEIVED, or PENDING -> CANCELLED.
//! RECEIVING is a transient lock taken with a conditional update so that two
//! concurrent receive calls cannot both credit stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{sequence, stock};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{
    order_total, validate_name, validate_order_line, OrderItem, StockDirection, StockReference,
    StockReferenceKind, VendorOrder, VendorOrderStatus,
};

/// Vendor order service
#[derive(Clone)]
pub struct VendorOrderService {
    db: PgPool,
}

/// Database row for a vendor order
#[derive(Debug, FromRow)]
struct VendorOrderRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    vendor_id: Uuid,
    warehouse_id: Uuid,
    order_number: String,
    order_date: NaiveDate,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    status: String,
    remark: Option<String>,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VendorOrderRow {
    fn into_order(self) -> AppResult<VendorOrder> {
        let status = VendorOrderStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown order status: {}", self.status)))?;
        Ok(VendorOrder {
            id: self.id,
            org_id: self.org_id,
            name: self.name,
            vendor_id: self.vendor_id,
            warehouse_id: self.warehouse_id,
            order_number: self.order_number,
            order_date: self.order_date,
            items: self.items.0,
            total_amount: self.total_amount,
            status,
            remark: self.remark,
            is_deleted: self.is_deleted,
            created_by: self.created_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, org_id, name, vendor_id, warehouse_id, order_number, order_date, \
                             items, total_amount, status, remark, is_deleted, created_by, \
                             created_at, updated_at";

/// One order line as submitted by the client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub rate: Decimal,
}

/// Input for creating a vendor order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorOrderInput {
    pub name: String,
    pub vendor_id: Uuid,
    pub warehouse_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub order_date: Option<NaiveDate>,
    pub remark: Option<String>,
}

/// Input for updating a vendor order; the status field is not settable here
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorOrderInput {
    pub name: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub order_date: Option<NaiveDate>,
    pub items: Option<Vec<OrderItemInput>>,
    pub remark: Option<String>,
}

/// Validate submitted lines and compute their amounts
pub(crate) fn validate_items(items: &[OrderItemInput]) -> AppResult<Vec<OrderItem>> {
    if items.is_empty() {
        return Err(AppError::validation("items", "Order items are required"));
    }
    items
        .iter()
        .map(|item| {
            validate_order_line(item.quantity, item.rate)
                .map_err(|m| AppError::validation("items", m))?;
            Ok(OrderItem::new(item.material_id, item.quantity, item.rate))
        })
        .collect()
}

impl VendorOrderService {
    /// Create a new VendorOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a vendor order in PENDING status
    pub async fn create(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateVendorOrderInput,
    ) -> AppResult<VendorOrder> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;
        let items = validate_items(&input.items)?;
        let total_amount = order_total(&items);

        // Vendor and warehouse must exist within the organization
        ensure_vendor_exists(&self.db, org_id, input.vendor_id).await?;
        ensure_warehouse_exists(&self.db, org_id, input.warehouse_id).await?;

        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;
        let order_number = sequence::next_document_number(&mut *tx, org_id, "PO").await?;

        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            INSERT INTO vendor_orders
                (org_id, name, vendor_id, warehouse_id, order_number, order_date,
                 items, total_amount, status, remark, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING', $9, $10)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(org_id)
        .bind(input.name.trim())
        .bind(input.vendor_id)
        .bind(input.warehouse_id)
        .bind(&order_number)
        .bind(order_date)
        .bind(Json(&items))
        .bind(total_amount)
        .bind(input.remark.as_deref().map(str::trim))
        .bind(Json(actor))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_order()
    }

    /// Get one vendor order
    pub async fn get(&self, org_id: Uuid, order_id: Uuid) -> AppResult<VendorOrder> {
        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM vendor_orders
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor order".to_string()))?;

        row.into_order()
    }

    /// List vendor orders, newest first
    pub async fn list(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<VendorOrder>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM vendor_orders WHERE org_id = $1 AND is_deleted = FALSE",
        )
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM vendor_orders
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
            .map(VendorOrderRow::into_order)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, PaginationMeta::new(total, page)))
    }

    /// Update an order that has not been received or cancelled
    pub async fn update(
        &self,
        org_id: Uuid,
        order_id: Uuid,
        input: UpdateVendorOrderInput,
    ) -> AppResult<VendorOrder> {
        if let Some(name) = &input.name {
            validate_name(name).map_err(|m| AppError::validation("name", m))?;
        }

        let (items, total_amount) = match &input.items {
            Some(items) => {
                let items = validate_items(items)?;
                let total = order_total(&items);
                (Some(items), Some(total))
            }
            None => (None, None),
        };

        if let Some(vendor_id) = input.vendor_id {
            ensure_vendor_exists(&self.db, org_id, vendor_id).await?;
        }
        if let Some(warehouse_id) = input.warehouse_id {
            ensure_warehouse_exists(&self.db, org_id, warehouse_id).await?;
        }

        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            UPDATE vendor_orders
            SET name = COALESCE($3, name),
                vendor_id = COALESCE($4, vendor_id),
                warehouse_id = COALESCE($5, warehouse_id),
                order_date = COALESCE($6, order_date),
                items = COALESCE($7, items),
                total_amount = COALESCE($8, total_amount),
                remark = COALESCE($9, remark),
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
              AND status NOT IN ('RECEIVED', 'CANCELLED')
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.vendor_id)
        .bind(input.warehouse_id)
        .bind(input.order_date)
        .bind(items.as_ref().map(Json))
        .bind(total_amount)
        .bind(input.remark.as_deref().map(str::trim))
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_order(),
            None => Err(self.missing_or_state(org_id, order_id, "updated").await?),
        }
    }

    /// Approve a pending order
    pub async fn approve(&self, org_id: Uuid, order_id: Uuid) -> AppResult<VendorOrder> {
        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            UPDATE vendor_orders
            SET status = 'APPROVED', updated_at = NOW()
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
            None => Err(self.missing_or_state(org_id, order_id, "approved").await?),
        }
    }

    /// Cancel a pending order
    pub async fn cancel(&self, org_id: Uuid, order_id: Uuid) -> AppResult<VendorOrder> {
        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            UPDATE vendor_orders
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

    /// Receive an approved order: credit stock for every item and append
    /// usage entries, all inside one transaction. A failure partway rolls
    /// everything back and leaves the order APPROVED.
    pub async fn receive(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        order_id: Uuid,
    ) -> AppResult<VendorOrder> {
        let mut tx = self.db.begin().await?;

        // Transient lock: only one caller can move APPROVED -> RECEIVING
        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            UPDATE vendor_orders
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
            return Err(self
                .missing_or_state(org_id, order_id, "received")
                .await?);
        };
        let order = row.into_order()?;

        let remark = order.remark.clone().unwrap_or_else(|| "Vendor order received".to_string());
        for item in &order.items {
            stock::stock_in(
                &mut *tx,
                org_id,
                item.material_id,
                order.warehouse_id,
                item.quantity,
                StockReferenceKind::VendorOrder,
                actor,
            )
            .await?;

            stock::append_usage(
                &mut *tx,
                org_id,
                item.material_id,
                order.warehouse_id,
                item.quantity,
                StockDirection::In,
                StockReference::VendorOrder(order.id),
                Some(&remark),
                actor,
            )
            .await?;
        }

        // Finalize within the same transaction
        let row = sqlx::query_as::<_, VendorOrderRow>(&format!(
            r#"
            UPDATE vendor_orders
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

    /// Soft-delete an order that has not been received
    pub async fn remove(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        order_id: Uuid,
    ) -> AppResult<()> {
        let deleted_by = actor.clone().stamped(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE vendor_orders
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status <> 'RECEIVED'
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
            "SELECT status FROM vendor_orders WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE",
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
            None => AppError::NotFound("Vendor order".to_string()),
        })
    }
}

/// Assert a vendor exists within the organization
async fn ensure_vendor_exists(db: &PgPool, org_id: Uuid, vendor_id: Uuid) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM vendors WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE)",
    )
    .bind(vendor_id)
    .bind(org_id)
    .fetch_one(db)
    .await?;

    if !exists {
        return Err(AppError::NotFound("Vendor".to_string()));
    }
    Ok(())
}

/// Assert a warehouse exists within the organization
pub(crate) async fn ensure_warehouse_exists(
    db: &PgPool,
    org_id: Uuid,
    warehouse_id: Uuid,
) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE)",
    )
    .bind(warehouse_id)
    .bind(org_id)
    .fetch_one(db)
    .await?;

    if !exists {
        return Err(AppError::NotFound("Warehouse".to_string()));
    }
    Ok(())
}
