//! Finance models: accounts, invoices, and payments

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AuditActor;

/// Kind of money account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Cash,
    Bank,
    Upi,
    Cheque,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "CASH",
            AccountType::Bank => "BANK",
            AccountType::Upi => "UPI",
            AccountType::Cheque => "CHEQUE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(AccountType::Cash),
            "BANK" => Some(AccountType::Bank),
            "UPI" => Some(AccountType::Upi),
            "CHEQUE" => Some(AccountType::Cheque),
            _ => None,
        }
    }
}

/// A money account whose balance moves only through payments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counterparty an invoice or payment refers to.
///
/// Serializes as `{"referenceType": "VENDOR", "referenceId": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "referenceType", content = "referenceId")]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyReference {
    Customer(Uuid),
    Vendor(Uuid),
}

impl PartyReference {
    pub fn kind(&self) -> &'static str {
        match self {
            PartyReference::Customer(_) => "CUSTOMER",
            PartyReference::Vendor(_) => "VENDOR",
        }
    }

    pub fn reference_id(&self) -> Uuid {
        match self {
            PartyReference::Customer(id) | PartyReference::Vendor(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "CUSTOMER" => Some(PartyReference::Customer(id)),
            "VENDOR" => Some(PartyReference::Vendor(id)),
            _ => None,
        }
    }
}

/// Which ledger an invoice belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceKind {
    Vendor,
    Customer,
    Finance,
}

impl InvoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::Vendor => "VENDOR",
            InvoiceKind::Customer => "CUSTOMER",
            InvoiceKind::Finance => "FINANCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VENDOR" => Some(InvoiceKind::Vendor),
            "CUSTOMER" => Some(InvoiceKind::Customer),
            "FINANCE" => Some(InvoiceKind::Finance),
            _ => None,
        }
    }

    /// Prefix used when the invoice number is auto-sequenced
    pub fn number_prefix(&self) -> &'static str {
        match self {
            InvoiceKind::Vendor => "PINV",
            InvoiceKind::Customer => "SINV",
            InvoiceKind::Finance => "FINV",
        }
    }
}

/// Payment status derived from paid/due amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(PaymentStatus::Unpaid),
            "PARTIAL" => Some(PaymentStatus::Partial),
            "PAID" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }

    /// Derive the status from the current paid and due amounts
    pub fn derive(paid_amount: Decimal, due_amount: Decimal) -> Self {
        if paid_amount <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else if due_amount <= Decimal::ZERO {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

/// An invoice raised against a vendor, customer, or the finance ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub org_id: Uuid,
    pub kind: InvoiceKind,
    #[serde(flatten)]
    pub party: PartyReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub amount: Decimal,
    pub tax_amount: Decimal,
    /// `amount + tax_amount`
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`, never negative
    pub due_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Direction money moves relative to the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentDirection {
    /// Money received, e.g. a customer payment
    In,
    /// Money paid out, e.g. a vendor payment
    Out,
}

impl PaymentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentDirection::In => "IN",
            PaymentDirection::Out => "OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(PaymentDirection::In),
            "OUT" => Some(PaymentDirection::Out),
            _ => None,
        }
    }

    /// The amount as it applies to an account balance
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            PaymentDirection::In => amount,
            PaymentDirection::Out => -amount,
        }
    }
}

/// Instrument a payment was made with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Cash,
    Bank,
    Upi,
    Cheque,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Bank => "BANK",
            PaymentMode::Upi => "UPI",
            PaymentMode::Cheque => "CHEQUE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMode::Cash),
            "BANK" => Some(PaymentMode::Bank),
            "UPI" => Some(PaymentMode::Upi),
            "CHEQUE" => Some(PaymentMode::Cheque),
            _ => None,
        }
    }
}

/// A payment applied against an account and, optionally, an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub org_id: Uuid,
    pub account_id: Uuid,
    #[serde(flatten)]
    pub party: PartyReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub direction: PaymentDirection,
    /// The applied amount; clamped to the invoice due amount at creation
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
