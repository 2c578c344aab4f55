//! Stock ledger tests
//!
//! Covers the ledger invariants:
//! - available and reserved quantities never go negative
//! - reserve then release restores the pre-reserve state (inverse law)
//! - reserve then consume reduces net stock only through consume

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{StockDirection, StockReference, StockReferenceKind};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory model of one stock record under the guarded updates: every
/// operation checks its precondition and applies both increments together,
/// exactly like the conditional UPDATE statements.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stock {
    available: Decimal,
    reserved: Decimal,
}

impl Stock {
    fn new() -> Self {
        Self {
            available: Decimal::ZERO,
            reserved: Decimal::ZERO,
        }
    }

    fn stock_in(&mut self, qty: Decimal) {
        self.available += qty;
    }

    fn reserve(&mut self, qty: Decimal) -> Result<(), &'static str> {
        if self.available < qty {
            return Err("insufficient available stock");
        }
        self.available -= qty;
        self.reserved += qty;
        Ok(())
    }

    fn release(&mut self, qty: Decimal) -> Result<(), &'static str> {
        if self.reserved < qty {
            return Err("insufficient reserved stock");
        }
        self.reserved -= qty;
        self.available += qty;
        Ok(())
    }

    fn consume(&mut self, qty: Decimal) -> Result<(), &'static str> {
        if self.reserved < qty {
            return Err("insufficient reserved stock");
        }
        self.reserved -= qty;
        Ok(())
    }

    fn stock_out(&mut self, qty: Decimal) -> Result<(), &'static str> {
        if self.available < qty {
            return Err("insufficient available stock");
        }
        self.available -= qty;
        Ok(())
    }

    fn total(&self) -> Decimal {
        self.available + self.reserved
    }

    fn non_negative(&self) -> bool {
        self.available >= Decimal::ZERO && self.reserved >= Decimal::ZERO
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_stock_in_credits_available() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        assert_eq!(stock.available, dec("10.0"));
        assert_eq!(stock.reserved, Decimal::ZERO);
    }

    #[test]
    fn test_reserve_moves_available_to_reserved() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        stock.reserve(dec("4.0")).unwrap();

        assert_eq!(stock.available, dec("6.0"));
        assert_eq!(stock.reserved, dec("4.0"));
        assert_eq!(stock.total(), dec("10.0"));
    }

    #[test]
    fn test_reserve_fails_without_stock() {
        let mut stock = Stock::new();
        assert!(stock.reserve(dec("1.0")).is_err());

        stock.stock_in(dec("5.0"));
        assert!(stock.reserve(dec("6.0")).is_err());
        // Failed reserve leaves the record untouched
        assert_eq!(stock.available, dec("5.0"));
        assert_eq!(stock.reserved, Decimal::ZERO);
    }

    #[test]
    fn test_release_is_inverse_of_reserve() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        let before = stock;

        stock.reserve(dec("7.0")).unwrap();
        stock.release(dec("7.0")).unwrap();

        assert_eq!(stock, before);
    }

    #[test]
    fn test_release_fails_beyond_reserved() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        stock.reserve(dec("3.0")).unwrap();

        assert!(stock.release(dec("4.0")).is_err());
        assert_eq!(stock.reserved, dec("3.0"));
    }

    #[test]
    fn test_consume_reduces_net_stock() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        stock.reserve(dec("4.0")).unwrap();
        let available_before = stock.available;

        stock.consume(dec("4.0")).unwrap();

        // Available untouched, reserved gone, total reduced by the consume
        assert_eq!(stock.available, available_before);
        assert_eq!(stock.reserved, Decimal::ZERO);
        assert_eq!(stock.total(), dec("6.0"));
    }

    #[test]
    fn test_consume_fails_beyond_reserved() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        stock.reserve(dec("2.0")).unwrap();

        assert!(stock.consume(dec("3.0")).is_err());
        assert_eq!(stock.reserved, dec("2.0"));
    }

    #[test]
    fn test_stock_out_debits_available_only() {
        let mut stock = Stock::new();
        stock.stock_in(dec("10.0"));
        stock.reserve(dec("4.0")).unwrap();

        stock.stock_out(dec("6.0")).unwrap();
        assert_eq!(stock.available, Decimal::ZERO);
        assert_eq!(stock.reserved, dec("4.0"));

        // Reserved stock is not reachable by a plain debit
        assert!(stock.stock_out(dec("1.0")).is_err());
    }

    #[test]
    fn test_stock_reference_parts_round_trip() {
        let id = Uuid::new_v4();
        let reference = StockReference::VendorOrder(id);

        assert_eq!(reference.kind(), StockReferenceKind::VendorOrder);
        assert_eq!(reference.reference_id(), Some(id));
        assert_eq!(
            StockReference::from_parts(reference.kind(), reference.reference_id()),
            Some(reference)
        );

        // Adjustments carry no id
        assert_eq!(
            StockReference::from_parts(StockReferenceKind::Adjustment, None),
            Some(StockReference::Adjustment)
        );
        assert_eq!(
            StockReference::from_parts(StockReferenceKind::Adjustment, Some(id)),
            None
        );
        assert_eq!(
            StockReference::from_parts(StockReferenceKind::VendorOrder, None),
            None
        );
    }

    #[test]
    fn test_direction_round_trip() {
        assert_eq!(StockDirection::parse("IN"), Some(StockDirection::In));
        assert_eq!(StockDirection::parse("OUT"), Some(StockDirection::Out));
        assert_eq!(StockDirection::parse("SIDEWAYS"), None);
        assert_eq!(StockDirection::In.as_str(), "IN");
    }

    #[test]
    fn test_usage_entry_serializes_flat_reference() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(StockReference::CustomerOrder(id)).unwrap();
        assert_eq!(value["referenceType"], "CUSTOMER_ORDER");
        assert_eq!(value["referenceId"], serde_json::json!(id));

        let value = serde_json::to_value(StockReference::Adjustment).unwrap();
        assert_eq!(value["referenceType"], "ADJUSTMENT");
        assert!(value.get("referenceId").is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// One arbitrary ledger operation
    #[derive(Debug, Clone, Copy)]
    enum Op {
        StockIn(Decimal),
        Reserve(Decimal),
        Release(Decimal),
        Consume(Decimal),
        StockOut(Decimal),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            quantity_strategy().prop_map(Op::StockIn),
            quantity_strategy().prop_map(Op::Reserve),
            quantity_strategy().prop_map(Op::Release),
            quantity_strategy().prop_map(Op::Consume),
            quantity_strategy().prop_map(Op::StockOut),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Quantities never go negative, whatever the operation sequence
        #[test]
        fn prop_quantities_never_negative(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut stock = Stock::new();

            for op in ops {
                let _ = match op {
                    Op::StockIn(q) => {
                        stock.stock_in(q);
                        Ok(())
                    }
                    Op::Reserve(q) => stock.reserve(q),
                    Op::Release(q) => stock.release(q),
                    Op::Consume(q) => stock.consume(q),
                    Op::StockOut(q) => stock.stock_out(q),
                };

                prop_assert!(stock.non_negative());
            }
        }

        /// A failed operation leaves the record exactly as it was
        #[test]
        fn prop_failed_op_is_a_no_op(
            initial in quantity_strategy(),
            extra in quantity_strategy()
        ) {
            let mut stock = Stock::new();
            stock.stock_in(initial);

            let before = stock;
            // More than is available or reserved: each must fail cleanly
            prop_assert!(stock.reserve(initial + extra).is_err());
            prop_assert_eq!(stock, before);
            prop_assert!(stock.consume(extra).is_err());
            prop_assert_eq!(stock, before);
            prop_assert!(stock.stock_out(initial + extra).is_err());
            prop_assert_eq!(stock, before);
        }

        /// reserve(q) . release(q) is the identity on the record
        #[test]
        fn prop_reserve_release_inverse(
            initial in quantity_strategy(),
            extra in quantity_strategy()
        ) {
            let mut stock = Stock::new();
            stock.stock_in(initial + extra);
            let before = stock;

            stock.reserve(initial).unwrap();
            stock.release(initial).unwrap();

            prop_assert_eq!(stock, before);
        }

        /// reserve(q) . consume(q) leaves available unchanged and shrinks the
        /// total by exactly q
        #[test]
        fn prop_reserve_consume_net_effect(
            initial in quantity_strategy(),
            extra in quantity_strategy()
        ) {
            let mut stock = Stock::new();
            stock.stock_in(initial + extra);
            let available_before = stock.available;
            let total_before = stock.total();

            stock.reserve(initial).unwrap();
            prop_assert_eq!(stock.total(), total_before); // reserve moves, never removes
            stock.consume(initial).unwrap();

            prop_assert_eq!(stock.available, available_before - initial);
            prop_assert_eq!(stock.total(), total_before - initial);
        }

        /// Total stock only changes through stock_in, consume, and stock_out
        #[test]
        fn prop_reserve_release_preserve_total(
            initial in quantity_strategy(),
            qty in quantity_strategy()
        ) {
            let mut stock = Stock::new();
            stock.stock_in(initial + qty);
            let total = stock.total();

            stock.reserve(qty).unwrap();
            prop_assert_eq!(stock.total(), total);
            stock.release(qty).unwrap();
            prop_assert_eq!(stock.total(), total);
        }
    }
}
