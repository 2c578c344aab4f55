//! Order workflow tests
//!
//! Covers the vendor and customer order state machines, item amount
//! computation, the transient-lock guard against double receive/deliver,
//! and the all-or-nothing stock effects of receive and deliver.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    order_total, validate_order_line, CustomerOrderStatus, OrderItem, VendorOrderStatus,
};
use shared::validation::format_document_number;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Conditional status update: succeeds only when the current status matches
/// the expected prior state, like the guarded UPDATE keyed on status.
fn vendor_cas(
    status: &mut VendorOrderStatus,
    expect: VendorOrderStatus,
    next: VendorOrderStatus,
) -> bool {
    if *status == expect {
        *status = next;
        true
    } else {
        false
    }
}

/// In-memory warehouse stock keyed by material, with transactional apply
#[derive(Debug, Clone, Default)]
struct Warehouse {
    available: HashMap<Uuid, Decimal>,
}

impl Warehouse {
    fn credit(&mut self, material: Uuid, qty: Decimal) {
        *self.available.entry(material).or_insert(Decimal::ZERO) += qty;
    }

    fn debit(&mut self, material: Uuid, qty: Decimal) -> Result<(), &'static str> {
        let balance = self.available.entry(material).or_insert(Decimal::ZERO);
        if *balance < qty {
            return Err("insufficient available stock");
        }
        *balance -= qty;
        Ok(())
    }

    fn balance(&self, material: Uuid) -> Decimal {
        self.available.get(&material).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Deliver all items or none: work on a copy, commit only on full success
fn deliver_atomically(
    warehouse: &mut Warehouse,
    items: &[(Uuid, Decimal)],
) -> Result<(), &'static str> {
    let mut staged = warehouse.clone();
    for (material, qty) in items {
        staged.debit(*material, *qty)?;
    }
    *warehouse = staged;
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_item_amount_is_quantity_times_rate() {
        let item = OrderItem::new(Uuid::new_v4(), dec("10"), dec("5"));
        assert_eq!(item.amount, dec("50"));
    }

    #[test]
    fn test_order_total_sums_item_amounts() {
        let items = vec![
            OrderItem::new(Uuid::new_v4(), dec("10"), dec("5")),
            OrderItem::new(Uuid::new_v4(), dec("3"), dec("7.5")),
        ];
        assert_eq!(order_total(&items), dec("72.5"));
    }

    #[test]
    fn test_order_line_validation() {
        assert!(validate_order_line(dec("1"), dec("0")).is_ok());
        assert!(validate_order_line(dec("0"), dec("5")).is_err());
        assert!(validate_order_line(dec("-1"), dec("5")).is_err());
        assert!(validate_order_line(dec("1"), dec("-0.01")).is_err());
    }

    #[test]
    fn test_vendor_status_transitions() {
        use VendorOrderStatus::*;

        let allowed = [
            (Pending, Approved),
            (Pending, Cancelled),
            (Approved, Receiving),
            (Receiving, Received),
        ];
        for (from, to) in allowed {
            assert!(from.can_transition(to), "{from:?} -> {to:?} should be allowed");
        }

        let forbidden = [
            (Pending, Received),
            (Pending, Receiving),
            (Approved, Received),  // must pass through the transient lock
            (Approved, Cancelled), // only pending orders cancel
            (Received, Pending),
            (Cancelled, Approved),
            (Received, Receiving),
        ];
        for (from, to) in forbidden {
            assert!(!from.can_transition(to), "{from:?} -> {to:?} should be rejected");
        }
    }

    #[test]
    fn test_customer_status_transitions() {
        use CustomerOrderStatus::*;

        assert!(Pending.can_transition(Confirmed));
        assert!(Pending.can_transition(Cancelled));
        assert!(Confirmed.can_transition(Delivering));
        assert!(Delivering.can_transition(Delivered));

        assert!(!Confirmed.can_transition(Delivered));
        assert!(!Confirmed.can_transition(Cancelled));
        assert!(!Delivered.can_transition(Pending));
        assert!(!Cancelled.can_transition(Confirmed));
    }

    #[test]
    fn test_editability_windows() {
        assert!(VendorOrderStatus::Pending.is_editable());
        assert!(VendorOrderStatus::Approved.is_editable());
        assert!(!VendorOrderStatus::Received.is_editable());
        assert!(!VendorOrderStatus::Cancelled.is_editable());

        assert!(CustomerOrderStatus::Pending.is_editable());
        assert!(CustomerOrderStatus::Confirmed.is_editable());
        assert!(!CustomerOrderStatus::Delivered.is_editable());
        assert!(!CustomerOrderStatus::Cancelled.is_editable());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            VendorOrderStatus::Pending,
            VendorOrderStatus::Approved,
            VendorOrderStatus::Receiving,
            VendorOrderStatus::Received,
            VendorOrderStatus::Cancelled,
        ] {
            assert_eq!(VendorOrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VendorOrderStatus::parse("SHIPPED"), None);
    }

    /// Concurrent receive calls: only the one that wins the conditional
    /// update credits stock
    #[test]
    fn test_double_receive_credits_once() {
        let material = Uuid::new_v4();
        let mut warehouse = Warehouse::default();
        let mut status = VendorOrderStatus::Approved;
        let qty = dec("10");

        let mut credits = 0;
        for _ in 0..2 {
            // Each caller first tries to take the transient lock
            if vendor_cas(&mut status, VendorOrderStatus::Approved, VendorOrderStatus::Receiving) {
                warehouse.credit(material, qty);
                credits += 1;
                assert!(vendor_cas(
                    &mut status,
                    VendorOrderStatus::Receiving,
                    VendorOrderStatus::Received
                ));
            }
        }

        assert_eq!(credits, 1);
        assert_eq!(warehouse.balance(material), qty);
        assert_eq!(status, VendorOrderStatus::Received);
    }

    /// With stock {A:5, B:5}, order [{A,3},{B,10}] -> delivery
    /// fails and both balances are unchanged
    #[test]
    fn test_delivery_shortfall_leaves_stock_unchanged() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut warehouse = Warehouse::default();
        warehouse.credit(a, dec("5"));
        warehouse.credit(b, dec("5"));

        let result = deliver_atomically(&mut warehouse, &[(a, dec("3")), (b, dec("10"))]);

        assert!(result.is_err());
        assert_eq!(warehouse.balance(a), dec("5"));
        assert_eq!(warehouse.balance(b), dec("5"));
    }

    #[test]
    fn test_delivery_success_debits_all_items() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut warehouse = Warehouse::default();
        warehouse.credit(a, dec("5"));
        warehouse.credit(b, dec("12"));

        deliver_atomically(&mut warehouse, &[(a, dec("3")), (b, dec("10"))]).unwrap();

        assert_eq!(warehouse.balance(a), dec("2"));
        assert_eq!(warehouse.balance(b), dec("2"));
    }

    #[test]
    fn test_document_number_format() {
        assert_eq!(format_document_number("PO", 1), "PO-000001");
        assert_eq!(format_document_number("SO", 42), "SO-000042");
        assert_eq!(format_document_number("TO", 123456), "TO-123456");
        // Width grows past six digits instead of truncating
        assert_eq!(format_document_number("PO", 1234567), "PO-1234567");
    }

    /// Order {qty 10, rate 5} -> total 50; approve; receive
    /// credits the warehouse by 10 and ends RECEIVED
    #[test]
    fn test_vendor_order_end_to_end() {
        let material = Uuid::new_v4();
        let items = vec![OrderItem::new(material, dec("10"), dec("5"))];
        assert_eq!(order_total(&items), dec("50"));

        let mut status = VendorOrderStatus::Pending;
        assert!(vendor_cas(&mut status, VendorOrderStatus::Pending, VendorOrderStatus::Approved));

        let mut warehouse = Warehouse::default();
        assert!(vendor_cas(&mut status, VendorOrderStatus::Approved, VendorOrderStatus::Receiving));
        for item in &items {
            warehouse.credit(item.material_id, item.quantity);
        }
        assert!(vendor_cas(&mut status, VendorOrderStatus::Receiving, VendorOrderStatus::Received));

        assert_eq!(warehouse.balance(material), dec("10"));
        assert_eq!(status, VendorOrderStatus::Received);
    }

    /// With 10 available, an order for 12 -> deliver fails, order
    /// stays CONFIRMED, stock unchanged
    #[test]
    fn test_customer_order_insufficient_stock() {
        let material = Uuid::new_v4();
        let mut warehouse = Warehouse::default();
        warehouse.credit(material, dec("10"));

        let mut status = CustomerOrderStatus::Confirmed;

        // The transient lock is taken inside the transaction, so the failed
        // delivery rolls the status back to CONFIRMED as well
        let mut staged_status = status;
        if staged_status == CustomerOrderStatus::Confirmed {
            staged_status = CustomerOrderStatus::Delivering;
            if deliver_atomically(&mut warehouse, &[(material, dec("12"))]).is_ok() {
                status = CustomerOrderStatus::Delivered;
            }
            // On failure the transaction aborts; `status` keeps its prior value
        }

        assert_eq!(status, CustomerOrderStatus::Confirmed);
        assert_eq!(warehouse.balance(material), dec("10"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating valid rates (may be zero)
    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn item_strategy() -> impl Strategy<Value = OrderItem> {
        (quantity_strategy(), rate_strategy())
            .prop_map(|(q, r)| OrderItem::new(Uuid::new_v4(), q, r))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Total always equals the sum of quantity * rate
        #[test]
        fn prop_total_matches_items(items in prop::collection::vec(item_strategy(), 1..10)) {
            let expected: Decimal = items.iter().map(|i| i.quantity * i.rate).sum();
            prop_assert_eq!(order_total(&items), expected);
        }

        /// Exactly one of N concurrent receive attempts wins the lock
        #[test]
        fn prop_only_one_receiver_wins(attempts in 1usize..20) {
            let mut status = VendorOrderStatus::Approved;
            let mut wins = 0;

            for _ in 0..attempts {
                if vendor_cas(&mut status, VendorOrderStatus::Approved, VendorOrderStatus::Receiving) {
                    wins += 1;
                    vendor_cas(&mut status, VendorOrderStatus::Receiving, VendorOrderStatus::Received);
                }
            }

            prop_assert_eq!(wins, 1);
            prop_assert_eq!(status, VendorOrderStatus::Received);
        }

        /// Atomic delivery either debits every item or none
        #[test]
        fn prop_delivery_all_or_nothing(
            stocks in prop::collection::vec(quantity_strategy(), 1..8),
            demands in prop::collection::vec(quantity_strategy(), 1..8)
        ) {
            let len = stocks.len().min(demands.len());
            let materials: Vec<Uuid> = (0..len).map(|_| Uuid::new_v4()).collect();

            let mut warehouse = Warehouse::default();
            for (material, qty) in materials.iter().zip(&stocks) {
                warehouse.credit(*material, *qty);
            }
            let before = warehouse.clone();

            let items: Vec<(Uuid, Decimal)> = materials
                .iter()
                .zip(&demands)
                .map(|(m, q)| (*m, *q))
                .collect();

            let feasible = items.iter().all(|(m, q)| before.balance(*m) >= *q);
            let result = deliver_atomically(&mut warehouse, &items);

            if feasible {
                prop_assert!(result.is_ok());
                for (m, q) in &items {
                    prop_assert_eq!(warehouse.balance(*m), before.balance(*m) - q);
                }
            } else {
                prop_assert!(result.is_err());
                for m in &materials {
                    prop_assert_eq!(warehouse.balance(*m), before.balance(*m));
                }
            }
        }

        /// Valid transitions form exactly the documented chain
        #[test]
        fn prop_no_transition_skips_the_lock(
            from_idx in 0usize..5,
            to_idx in 0usize..5
        ) {
            use VendorOrderStatus::*;
            let states = [Pending, Approved, Receiving, Received, Cancelled];
            let from = states[from_idx];
            let to = states[to_idx];

            let expected = matches!(
                (from, to),
                (Pending, Approved) | (Pending, Cancelled) | (Approved, Receiving) | (Receiving, Received)
            );
            prop_assert_eq!(from.can_transition(to), expected);
        }
    }
}
