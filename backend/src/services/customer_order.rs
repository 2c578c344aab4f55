//! Customer (sales) order workflow service
//!
//! PENDING -> CONFIRMED -> DELIVERING -> DELIVERED, or PENDING -> CANCELLED.
//! Delivery debits available stock; any item shortfall aborts the whole
//! transaction and the order stays CONFIRMED.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::vendor_order::{ensure_warehouse_exists, validate_items, OrderItemInput};
use crate::services::{sequence, stock};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{
    order_total, validate_name, CustomerOrder, CustomerOrderStatus, OrderItem, StockDirection,
    StockReference, StockReferenceKind,
};

/// Customer order service
#[derive(Clone)]
pub struct CustomerOrderService {
    db: PgPool,
}

/// Database row for a customer order
#[derive(Debug, FromRow)]
struct CustomerOrderRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    customer_id: Uuid,
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

impl CustomerOrderRow {
    fn into_order(self) -> AppResult<CustomerOrder> {
        let status = CustomerOrderStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown order status: {}", self.status)))?;
        Ok(CustomerOrder {
            id: self.id,
            org_id: self.org_id,
            name: self.name,
            customer_id: self.customer_id,
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

const ORDER_COLUMNS: &str = "id, org_id, name, customer_id, warehouse_id, order_number, \
                             order_date, items, total_amount, status, remark, is_deleted, \
                             created_by, created_at, updated_at";

/// Input for creating a customer order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerOrderInput {
    pub name: String,
    pub customer_id: Uuid,
    pub warehouse_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub order_date: Option<NaiveDate>,
    pub remark: Option<String>,
}

/// Input for updating a customer order; the status field is not settable here
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerOrderInput {
    pub name: Option<String>,
    pub customer_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub order_date: Option<NaiveDate>,
    pub items: Option<Vec<OrderItemInput>>,
    pub remark: Option<String>,
}

impl CustomerOrderService {
    /// Create a new CustomerOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a customer order in PENDING status
    pub async fn create(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateCustomerOrderInput,
    ) -> AppResult<CustomerOrder> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;
        let items = validate_items(&input.items)?;
        let total_amount = order_total(&items);

        ensure_customer_exists(&self.db, org_id, input.customer_id).await?;
        ensure_warehouse_exists(&self.db, org_id, input.warehouse_id).await?;

        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;
        let order_number = sequence::next_document_number(&mut *tx, org_id, "SO").await?;

        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            INSERT INTO customer_orders
                (org_id, name, customer_id, warehouse_id, order_number, order_date,
                 items, total_amount, status, remark, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING', $9, $10)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(org_id)
        .bind(input.name.trim())
        .bind(input.customer_id)
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

    /// Get one customer order
    pub async fn get(&self, org_id: Uuid, order_id: Uuid) -> AppResult<CustomerOrder> {
        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM customer_orders
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer order".to_string()))?;

        row.into_order()
    }

    /// List customer orders, newest first
    pub async fn list(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<CustomerOrder>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customer_orders WHERE org_id = $1 AND is_deleted = FALSE",
        )
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM customer_orders
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
            .map(CustomerOrderRow::into_order)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, PaginationMeta::new(total, page)))
    }

    /// Update an order that has not been delivered or cancelled
    pub async fn update(
        &self,
        org_id: Uuid,
        order_id: Uuid,
        input: UpdateCustomerOrderInput,
    ) -> AppResult<CustomerOrder> {
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

        if let Some(customer_id) = input.customer_id {
            ensure_customer_exists(&self.db, org_id, customer_id).await?;
        }
        if let Some(warehouse_id) = input.warehouse_id {
            ensure_warehouse_exists(&self.db, org_id, warehouse_id).await?;
        }

        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            UPDATE customer_orders
            SET name = COALESCE($3, name),
                customer_id = COALESCE($4, customer_id),
                warehouse_id = COALESCE($5, warehouse_id),
                order_date = COALESCE($6, order_date),
                items = COALESCE($7, items),
                total_amount = COALESCE($8, total_amount),
                remark = COALESCE($9, remark),
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
              AND status NOT IN ('DELIVERED', 'CANCELLED')
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(org_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.customer_id)
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

    /// Confirm a pending order
    pub async fn confirm(&self, org_id: Uuid, order_id: Uuid) -> AppResult<CustomerOrder> {
        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            UPDATE customer_orders
            SET status = 'CONFIRMED', updated_at = NOW()
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
            None => Err(self.missing_or_state(org_id, order_id, "confirmed").await?),
        }
    }

    /// Cancel a pending order
    pub async fn cancel(&self, org_id: Uuid, order_id: Uuid) -> AppResult<CustomerOrder> {
        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            UPDATE customer_orders
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

    /// Deliver a confirmed order: debit available stock for every item and
    /// append usage entries inside one transaction. Any shortfall rolls the
    /// whole delivery back.
    pub async fn deliver(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        order_id: Uuid,
    ) -> AppResult<CustomerOrder> {
        let mut tx = self.db.begin().await?;

        // Transient lock: only one caller can move CONFIRMED -> DELIVERING
        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            UPDATE customer_orders
            SET status = 'DELIVERING', updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status = 'CONFIRMED'
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
                .missing_or_state(org_id, order_id, "delivered")
                .await?);
        };
        let order = row.into_order()?;

        let remark = order
            .remark
            .clone()
            .unwrap_or_else(|| "Customer order delivered".to_string());
        for item in &order.items {
            stock::stock_out(
                &mut *tx,
                org_id,
                item.material_id,
                order.warehouse_id,
                item.quantity,
                StockReferenceKind::CustomerOrder,
            )
            .await?;

            stock::append_usage(
                &mut *tx,
                org_id,
                item.material_id,
                order.warehouse_id,
                item.quantity,
                StockDirection::Out,
                StockReference::CustomerOrder(order.id),
                Some(&remark),
                actor,
            )
            .await?;
        }

        // Finalize within the same transaction
        let row = sqlx::query_as::<_, CustomerOrderRow>(&format!(
            r#"
            UPDATE customer_orders
            SET status = 'DELIVERED', updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND status = 'DELIVERING'
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

    /// Soft-delete an order that has not been delivered
    pub async fn remove(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        order_id: Uuid,
    ) -> AppResult<()> {
        let deleted_by = actor.clone().stamped(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE customer_orders
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE AND status <> 'DELIVERED'
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
            "SELECT status FROM customer_orders WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE",
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
            None => AppError::NotFound("Customer order".to_string()),
        })
    }
}

/// Assert a customer exists within the organization
async fn ensure_customer_exists(db: &PgPool, org_id: Uuid, customer_id: Uuid) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE)",
    )
    .bind(customer_id)
    .bind(org_id)
    .fetch_one(db)
    .await?;

    if !exists {
        return Err(AppError::NotFound("Customer".to_string()));
    }
    Ok(())
}
