//! Invoice management tests
//!
//! Covers the amount invariants (total = amount + tax, due = total - paid),
//! payment status derivation, number formatting, and the paid-invoice lock.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::validation::format_document_number;
use shared::{validate_money, InvoiceKind, PaymentStatus};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory invoice mirroring the service's create/update/apply rules
#[derive(Debug, Clone, Copy, PartialEq)]
struct Invoice {
    amount: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    paid_amount: Decimal,
    due_amount: Decimal,
    status: PaymentStatus,
}

impl Invoice {
    fn create(amount: Decimal, tax_amount: Decimal) -> Self {
        let total_amount = amount + tax_amount;
        Self {
            amount,
            tax_amount,
            total_amount,
            paid_amount: Decimal::ZERO,
            due_amount: total_amount,
            status: PaymentStatus::Unpaid,
        }
    }

    /// Edit amount/tax; rejected once any payment has been applied
    fn update(&mut self, amount: Decimal, tax_amount: Decimal) -> Result<(), &'static str> {
        if self.paid_amount > Decimal::ZERO {
            return Err("invoice locked");
        }
        self.amount = amount;
        self.tax_amount = tax_amount;
        self.total_amount = amount + tax_amount;
        self.due_amount = self.total_amount - self.paid_amount;
        self.status = PaymentStatus::derive(self.paid_amount, self.due_amount);
        Ok(())
    }

    /// Apply a payment clamped to the due amount; returns the applied value
    fn apply_payment(&mut self, amount: Decimal) -> Decimal {
        let payable = amount.min(self.due_amount);
        self.paid_amount += payable;
        self.due_amount -= payable;
        self.status = PaymentStatus::derive(self.paid_amount, self.due_amount);
        payable
    }

    fn invariants_hold(&self) -> bool {
        self.total_amount == self.amount + self.tax_amount
            && self.due_amount == self.total_amount - self.paid_amount
            && self.due_amount >= Decimal::ZERO
            && self.paid_amount >= Decimal::ZERO
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_create_computes_totals() {
        let invoice = Invoice::create(dec("100"), dec("18"));

        assert_eq!(invoice.total_amount, dec("118"));
        assert_eq!(invoice.paid_amount, Decimal::ZERO);
        assert_eq!(invoice.due_amount, dec("118"));
        assert_eq!(invoice.status, PaymentStatus::Unpaid);
        assert!(invoice.invariants_hold());
    }

    #[test]
    fn test_update_recomputes_totals() {
        let mut invoice = Invoice::create(dec("100"), dec("18"));
        invoice.update(dec("200"), dec("36")).unwrap();

        assert_eq!(invoice.total_amount, dec("236"));
        assert_eq!(invoice.due_amount, dec("236"));
        assert!(invoice.invariants_hold());
    }

    #[test]
    fn test_paid_invoice_is_locked() {
        let mut invoice = Invoice::create(dec("100"), dec("0"));
        invoice.apply_payment(dec("40"));

        let before = invoice;
        assert!(invoice.update(dec("500"), dec("0")).is_err());
        // The failed edit leaves the invoice unmodified
        assert_eq!(invoice, before);
    }

    #[test]
    fn test_partial_payment_status() {
        let mut invoice = Invoice::create(dec("100"), dec("0"));
        invoice.apply_payment(dec("40"));

        assert_eq!(invoice.paid_amount, dec("40"));
        assert_eq!(invoice.due_amount, dec("60"));
        assert_eq!(invoice.status, PaymentStatus::Partial);
    }

    #[test]
    fn test_full_payment_status() {
        let mut invoice = Invoice::create(dec("100"), dec("18"));
        let applied = invoice.apply_payment(dec("118"));

        assert_eq!(applied, dec("118"));
        assert_eq!(invoice.due_amount, Decimal::ZERO);
        assert_eq!(invoice.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_overpayment_is_clamped() {
        let mut invoice = Invoice::create(dec("100"), dec("0"));
        let applied = invoice.apply_payment(dec("150"));

        assert_eq!(applied, dec("100"));
        assert_eq!(invoice.due_amount, Decimal::ZERO);
        assert!(invoice.invariants_hold());
    }

    #[test]
    fn test_status_derivation_table() {
        assert_eq!(PaymentStatus::derive(dec("0"), dec("118")), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::derive(dec("50"), dec("68")), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::derive(dec("118"), dec("0")), PaymentStatus::Paid);
        // A zero-total invoice with nothing paid stays UNPAID
        assert_eq!(PaymentStatus::derive(dec("0"), dec("0")), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_money_validation() {
        assert!(validate_money(Decimal::ZERO).is_ok());
        assert!(validate_money(dec("10.50")).is_ok());
        assert!(validate_money(dec("-0.01")).is_err());
    }

    #[test]
    fn test_invoice_number_prefixes() {
        assert_eq!(InvoiceKind::Vendor.number_prefix(), "PINV");
        assert_eq!(InvoiceKind::Customer.number_prefix(), "SINV");
        assert_eq!(InvoiceKind::Finance.number_prefix(), "FINV");

        assert_eq!(
            format_document_number(InvoiceKind::Finance.number_prefix(), 7),
            "FINV-000007"
        );
    }

    #[test]
    fn test_invoice_kind_round_trip() {
        for kind in [InvoiceKind::Vendor, InvoiceKind::Customer, InvoiceKind::Finance] {
            assert_eq!(InvoiceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(InvoiceKind::parse("PROFORMA"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000_00i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn positive_money_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_00i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// total = amount + tax and due = total - paid after create
        #[test]
        fn prop_create_invariants(amount in money_strategy(), tax in money_strategy()) {
            let invoice = Invoice::create(amount, tax);
            prop_assert!(invoice.invariants_hold());
        }

        /// Invariants survive any sequence of payments
        #[test]
        fn prop_payments_keep_invariants(
            amount in money_strategy(),
            tax in money_strategy(),
            payments in prop::collection::vec(positive_money_strategy(), 0..10)
        ) {
            let mut invoice = Invoice::create(amount, tax);

            for payment in payments {
                invoice.apply_payment(payment);
                prop_assert!(invoice.invariants_hold());
            }
        }

        /// The due amount never goes negative, whatever is thrown at it
        #[test]
        fn prop_due_never_negative(
            amount in money_strategy(),
            payments in prop::collection::vec(positive_money_strategy(), 1..10)
        ) {
            let mut invoice = Invoice::create(amount, Decimal::ZERO);

            for payment in payments {
                invoice.apply_payment(payment);
                prop_assert!(invoice.due_amount >= Decimal::ZERO);
            }
        }

        /// Applied payments sum to at most the invoice total
        #[test]
        fn prop_paid_never_exceeds_total(
            amount in money_strategy(),
            tax in money_strategy(),
            payments in prop::collection::vec(positive_money_strategy(), 1..10)
        ) {
            let mut invoice = Invoice::create(amount, tax);
            let mut applied_sum = Decimal::ZERO;

            for payment in payments {
                applied_sum += invoice.apply_payment(payment);
            }

            prop_assert!(invoice.paid_amount <= invoice.total_amount);
            prop_assert_eq!(invoice.paid_amount, applied_sum);
        }

        /// Once locked, always locked: any paid invoice rejects edits
        #[test]
        fn prop_locked_invoice_rejects_edits(
            amount in positive_money_strategy(),
            payment in positive_money_strategy(),
            new_amount in money_strategy()
        ) {
            let mut invoice = Invoice::create(amount, Decimal::ZERO);
            invoice.apply_payment(payment);
            prop_assume!(invoice.paid_amount > Decimal::ZERO);

            let before = invoice;
            prop_assert!(invoice.update(new_amount, Decimal::ZERO).is_err());
            prop_assert_eq!(invoice, before);
        }
    }
}
