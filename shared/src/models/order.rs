//! Order models: vendor purchase orders, customer sales orders, and
//! warehouse transfer orders, together with their status state machines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AuditActor;

/// One line of a vendor or customer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub rate: Decimal,
    /// `quantity * rate`, computed at validation time
    pub amount: Decimal,
}

impl OrderItem {
    pub fn new(material_id: Uuid, quantity: Decimal, rate: Decimal) -> Self {
        Self {
            material_id,
            quantity,
            rate,
            amount: quantity * rate,
        }
    }
}

/// Sum of item amounts for an order
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(|i| i.amount).sum()
}

/// One line of a warehouse transfer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferItem {
    pub material_id: Uuid,
    pub quantity: Decimal,
}

/// Vendor (purchase) order lifecycle.
///
/// `Receiving` is a transient lock taken while stock is credited so that two
/// concurrent receive calls cannot both pass the precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorOrderStatus {
    Pending,
    Approved,
    Receiving,
    Received,
    Cancelled,
}

impl VendorOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorOrderStatus::Pending => "PENDING",
            VendorOrderStatus::Approved => "APPROVED",
            VendorOrderStatus::Receiving => "RECEIVING",
            VendorOrderStatus::Received => "RECEIVED",
            VendorOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(VendorOrderStatus::Pending),
            "APPROVED" => Some(VendorOrderStatus::Approved),
            "RECEIVING" => Some(VendorOrderStatus::Receiving),
            "RECEIVED" => Some(VendorOrderStatus::Received),
            "CANCELLED" => Some(VendorOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition(self, next: VendorOrderStatus) -> bool {
        use VendorOrderStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Cancelled) | (Approved, Receiving) | (Receiving, Received)
        )
    }

    /// Items and amounts may still change while the order is editable
    pub fn is_editable(self) -> bool {
        !matches!(self, VendorOrderStatus::Received | VendorOrderStatus::Cancelled)
    }
}

/// Customer (sales) order lifecycle; `Delivering` mirrors `Receiving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerOrderStatus {
    Pending,
    Confirmed,
    Delivering,
    Delivered,
    Cancelled,
}

impl CustomerOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerOrderStatus::Pending => "PENDING",
            CustomerOrderStatus::Confirmed => "CONFIRMED",
            CustomerOrderStatus::Delivering => "DELIVERING",
            CustomerOrderStatus::Delivered => "DELIVERED",
            CustomerOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(CustomerOrderStatus::Pending),
            "CONFIRMED" => Some(CustomerOrderStatus::Confirmed),
            "DELIVERING" => Some(CustomerOrderStatus::Delivering),
            "DELIVERED" => Some(CustomerOrderStatus::Delivered),
            "CANCELLED" => Some(CustomerOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition(self, next: CustomerOrderStatus) -> bool {
        use CustomerOrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Delivering)
                | (Delivering, Delivered)
        )
    }

    pub fn is_editable(self) -> bool {
        !matches!(
            self,
            CustomerOrderStatus::Delivered | CustomerOrderStatus::Cancelled
        )
    }
}

/// Warehouse transfer order lifecycle. Approval reserves stock at the
/// source; receive moves it to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Approved,
    Receiving,
    Received,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Approved => "APPROVED",
            TransferStatus::Receiving => "RECEIVING",
            TransferStatus::Received => "RECEIVED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransferStatus::Pending),
            "APPROVED" => Some(TransferStatus::Approved),
            "RECEIVING" => Some(TransferStatus::Receiving),
            "RECEIVED" => Some(TransferStatus::Received),
            "CANCELLED" => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition(self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Cancelled) | (Approved, Receiving) | (Receiving, Received)
        )
    }

    pub fn is_editable(self) -> bool {
        matches!(self, TransferStatus::Pending)
    }
}

/// A purchase order placed with a vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorOrder {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub vendor_id: Uuid,
    pub warehouse_id: Uuid,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: VendorOrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sales order placed by a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrder {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub customer_id: Uuid,
    pub warehouse_id: Uuid,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: CustomerOrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stock transfer between two warehouses of the same organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseTransferOrder {
    pub id: Uuid,
    pub org_id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub items: Vec<TransferItem>,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
