//! Stock ledger models: per-warehouse material quantities and the usage log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AuditActor;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockDirection::In => "IN",
            StockDirection::Out => "OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(StockDirection::In),
            "OUT" => Some(StockDirection::Out),
            _ => None,
        }
    }
}

/// Kind of event that last touched a stock record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockReferenceKind {
    VendorOrder,
    CustomerOrder,
    WarehouseTransfer,
    Adjustment,
}

impl StockReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockReferenceKind::VendorOrder => "VENDOR_ORDER",
            StockReferenceKind::CustomerOrder => "CUSTOMER_ORDER",
            StockReferenceKind::WarehouseTransfer => "WAREHOUSE_TRANSFER",
            StockReferenceKind::Adjustment => "ADJUSTMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VENDOR_ORDER" => Some(StockReferenceKind::VendorOrder),
            "CUSTOMER_ORDER" => Some(StockReferenceKind::CustomerOrder),
            "WAREHOUSE_TRANSFER" => Some(StockReferenceKind::WarehouseTransfer),
            "ADJUSTMENT" => Some(StockReferenceKind::Adjustment),
            _ => None,
        }
    }
}

/// The event a stock movement traces back to.
///
/// Serializes as `{"referenceType": "VENDOR_ORDER", "referenceId": "..."}`;
/// manual adjustments carry no id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "referenceType", content = "referenceId")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockReference {
    VendorOrder(Uuid),
    CustomerOrder(Uuid),
    WarehouseTransfer(Uuid),
    Adjustment,
}

impl StockReference {
    pub fn kind(&self) -> StockReferenceKind {
        match self {
            StockReference::VendorOrder(_) => StockReferenceKind::VendorOrder,
            StockReference::CustomerOrder(_) => StockReferenceKind::CustomerOrder,
            StockReference::WarehouseTransfer(_) => StockReferenceKind::WarehouseTransfer,
            StockReference::Adjustment => StockReferenceKind::Adjustment,
        }
    }

    pub fn reference_id(&self) -> Option<Uuid> {
        match self {
            StockReference::VendorOrder(id)
            | StockReference::CustomerOrder(id)
            | StockReference::WarehouseTransfer(id) => Some(*id),
            StockReference::Adjustment => None,
        }
    }

    /// Rebuild the reference from its persisted `(kind, id)` column pair
    pub fn from_parts(kind: StockReferenceKind, id: Option<Uuid>) -> Option<Self> {
        match (kind, id) {
            (StockReferenceKind::VendorOrder, Some(id)) => Some(StockReference::VendorOrder(id)),
            (StockReferenceKind::CustomerOrder, Some(id)) => {
                Some(StockReference::CustomerOrder(id))
            }
            (StockReferenceKind::WarehouseTransfer, Some(id)) => {
                Some(StockReference::WarehouseTransfer(id))
            }
            (StockReferenceKind::Adjustment, None) => Some(StockReference::Adjustment),
            _ => None,
        }
    }
}

/// Stock on hand for one material in one warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialStock {
    pub id: Uuid,
    pub org_id: Uuid,
    pub material_id: Uuid,
    pub warehouse_id: Uuid,
    pub available_qty: Decimal,
    pub reserved_qty: Decimal,
    /// Kind of the last event that mutated this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<StockReferenceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable entry in the stock usage audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUsageEntry {
    pub id: Uuid,
    pub org_id: Uuid,
    pub material_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub direction: StockDirection,
    #[serde(flatten)]
    pub reference: StockReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub created_by: AuditActor,
    pub created_at: DateTime<Utc>,
}
