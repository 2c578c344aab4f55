//! Warehouse transfer workflow tests
//!
//! Approval reserves stock at the source; receive consumes the reservation
//! and credits the destination. Any shortfall aborts the whole step.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{validate_distinct_warehouses, validate_quantity, TransferStatus};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// One warehouse's record for a single material
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stock {
    available: Decimal,
    reserved: Decimal,
}

impl Stock {
    fn new(available: Decimal) -> Self {
        Self {
            available,
            reserved: Decimal::ZERO,
        }
    }

    fn reserve(&mut self, qty: Decimal) -> Result<(), &'static str> {
        if self.available < qty {
            return Err("insufficient available stock");
        }
        self.available -= qty;
        self.reserved += qty;
        Ok(())
    }

    fn consume(&mut self, qty: Decimal) -> Result<(), &'static str> {
        if self.reserved < qty {
            return Err("insufficient reserved stock");
        }
        self.reserved -= qty;
        Ok(())
    }

    fn credit(&mut self, qty: Decimal) {
        self.available += qty;
    }

    fn total(&self) -> Decimal {
        self.available + self.reserved
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_distinct_warehouse_validation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_distinct_warehouses(a, b).is_ok());
        assert!(validate_distinct_warehouses(a, a).is_err());
    }

    #[test]
    fn test_transfer_item_quantity_validation() {
        assert!(validate_quantity(dec("0.5")).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(dec("-2")).is_err());
    }

    #[test]
    fn test_transfer_status_transitions() {
        use TransferStatus::*;

        assert!(Pending.can_transition(Approved));
        assert!(Pending.can_transition(Cancelled));
        assert!(Approved.can_transition(Receiving));
        assert!(Receiving.can_transition(Received));

        assert!(!Approved.can_transition(Cancelled));
        assert!(!Approved.can_transition(Received));
        assert!(!Cancelled.can_transition(Approved));
        assert!(!Received.can_transition(Pending));
    }

    #[test]
    fn test_only_pending_transfers_are_editable() {
        assert!(TransferStatus::Pending.is_editable());
        assert!(!TransferStatus::Approved.is_editable());
        assert!(!TransferStatus::Received.is_editable());
        assert!(!TransferStatus::Cancelled.is_editable());
    }

    #[test]
    fn test_approval_reserves_at_source() {
        let mut source = Stock::new(dec("20"));
        source.reserve(dec("8")).unwrap();

        assert_eq!(source.available, dec("12"));
        assert_eq!(source.reserved, dec("8"));
        // Reservation earmarks stock without removing it
        assert_eq!(source.total(), dec("20"));
    }

    #[test]
    fn test_approval_shortfall_fails() {
        let mut source = Stock::new(dec("5"));
        assert!(source.reserve(dec("8")).is_err());
        assert_eq!(source.available, dec("5"));
    }

    #[test]
    fn test_receive_moves_stock_between_warehouses() {
        let mut source = Stock::new(dec("20"));
        let mut destination = Stock::new(Decimal::ZERO);
        let qty = dec("8");

        source.reserve(qty).unwrap();

        // Receive: consume the source reservation, credit the destination
        source.consume(qty).unwrap();
        destination.credit(qty);

        assert_eq!(source.available, dec("12"));
        assert_eq!(source.reserved, Decimal::ZERO);
        assert_eq!(destination.available, qty);
        // No stock appears or disappears across the pair
        assert_eq!(source.total() + destination.total(), dec("20"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A completed transfer conserves total stock across both warehouses
        #[test]
        fn prop_transfer_conserves_stock(
            initial in quantity_strategy(),
            extra in quantity_strategy()
        ) {
            let qty = initial;
            let mut source = Stock::new(initial + extra);
            let mut destination = Stock::new(Decimal::ZERO);
            let combined = source.total() + destination.total();

            source.reserve(qty).unwrap();
            prop_assert_eq!(source.total() + destination.total(), combined);

            source.consume(qty).unwrap();
            destination.credit(qty);
            prop_assert_eq!(source.total() + destination.total(), combined);
        }

        /// An aborted approval leaves the source untouched
        #[test]
        fn prop_failed_approval_is_a_no_op(
            available in quantity_strategy(),
            excess in quantity_strategy()
        ) {
            let mut source = Stock::new(available);
            let before = source;

            prop_assert!(source.reserve(available + excess).is_err());
            prop_assert_eq!(source, before);
        }
    }
}
