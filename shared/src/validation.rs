//! Validation utilities for the Business Management Platform
//!
//! Pure functions shared by the backend services and the test suite.

use rust_decimal::Decimal;
use uuid::Uuid;

// ============================================================================
// Order & Stock Validations
// ============================================================================

/// Validate a stock or order quantity (must be strictly positive)
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate an order item rate (must not be negative)
pub fn validate_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO {
        return Err("Rate cannot be negative");
    }
    Ok(())
}

/// Validate one order line (quantity and rate together)
pub fn validate_order_line(quantity: Decimal, rate: Decimal) -> Result<(), &'static str> {
    validate_quantity(quantity)?;
    validate_rate(rate)
}

/// Warehouse transfers must move stock between two distinct warehouses
pub fn validate_distinct_warehouses(from: Uuid, to: Uuid) -> Result<(), &'static str> {
    if from == to {
        return Err("Source and destination warehouse must differ");
    }
    Ok(())
}

// ============================================================================
// Finance Validations
// ============================================================================

/// Validate an invoice amount or tax amount (must not be negative)
pub fn validate_money(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate a payment amount (must be strictly positive)
pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be positive");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate a required display name is non-empty after trimming
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty");
    }
    Ok(())
}

/// Format a generated document number: prefix plus a fixed-width sequence,
/// e.g. `PO-000042`
pub fn format_document_number(prefix: &str, value: i64) -> String {
    format!("{}-{:06}", prefix, value)
}
