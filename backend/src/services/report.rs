//! Reporting service for inventory and order analytics
//! Provides current-stock, purchase, and sales reports with CSV export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::DateRangeQuery;

/// Reporting service
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

/// Current stock report entry
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStockReport {
    pub material_id: Uuid,
    pub material_name: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub available_qty: Decimal,
    pub reserved_qty: Decimal,
}

/// Purchase report entry (vendor orders)
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReport {
    pub order_id: Uuid,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub vendor_name: String,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Sales report entry (customer orders)
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub order_id: Uuid,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub customer_name: String,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ReportService {
    /// Create a new ReportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock on hand joined with material and warehouse names
    pub async fn current_stock(&self, org_id: Uuid) -> AppResult<Vec<CurrentStockReport>> {
        let rows = sqlx::query_as::<_, CurrentStockReport>(
            r#"
            SELECT ms.material_id, m.name AS material_name,
                   ms.warehouse_id, w.name AS warehouse_name,
                   ms.available_qty, ms.reserved_qty
            FROM material_stocks ms
            JOIN materials m ON m.id = ms.material_id
            JOIN warehouses w ON w.id = ms.warehouse_id
            WHERE ms.org_id = $1 AND ms.is_deleted = FALSE
            ORDER BY m.name, w.name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Vendor orders over an optional date range
    pub async fn purchase_report(
        &self,
        org_id: Uuid,
        range: &DateRangeQuery,
    ) -> AppResult<Vec<PurchaseReport>> {
        let rows = sqlx::query_as::<_, PurchaseReport>(
            r#"
            SELECT vo.id AS order_id, vo.order_number, vo.order_date,
                   v.name AS vendor_name, vo.total_amount, vo.status, vo.created_at
            FROM vendor_orders vo
            JOIN vendors v ON v.id = vo.vendor_id
            WHERE vo.org_id = $1 AND vo.is_deleted = FALSE
              AND ($2::date IS NULL OR vo.order_date >= $2)
              AND ($3::date IS NULL OR vo.order_date <= $3)
            ORDER BY vo.order_date DESC, vo.created_at DESC
            "#,
        )
        .bind(org_id)
        .bind(range.from_date)
        .bind(range.to_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Customer orders over an optional date range
    pub async fn sales_report(
        &self,
        org_id: Uuid,
        range: &DateRangeQuery,
    ) -> AppResult<Vec<SalesReport>> {
        let rows = sqlx::query_as::<_, SalesReport>(
            r#"
            SELECT co.id AS order_id, co.order_number, co.order_date,
                   c.name AS customer_name, co.total_amount, co.status, co.created_at
            FROM customer_orders co
            JOIN customers c ON c.id = co.customer_id
            WHERE co.org_id = $1 AND co.is_deleted = FALSE
              AND ($2::date IS NULL OR co.order_date >= $2)
              AND ($3::date IS NULL OR co.order_date <= $3)
            ORDER BY co.order_date DESC, co.created_at DESC
            "#,
        )
        .bind(org_id)
        .bind(range.from_date)
        .bind(range.to_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Export report data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }

        let csv_data = String::from_utf8(wtr.into_inner().map_err(|e| {
            AppError::Internal(format!("CSV writer error: {}", e))
        })?)
        .map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))?;

        Ok(csv_data)
    }
}
