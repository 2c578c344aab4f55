//! Payment application and reversal tests
//!
//! Covers the account balance arithmetic, the clamp against the invoice due
//! amount, the pure reversal+reapply law for updates, and the end-to-end
//! invoice reconciliation scenario.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{PaymentDirection, PaymentStatus};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory account
#[derive(Debug, Clone, Copy, PartialEq)]
struct Account {
    current_balance: Decimal,
}

impl Account {
    fn new(opening_balance: Decimal) -> Self {
        // Current balance is seeded from the opening balance at creation
        Self {
            current_balance: opening_balance,
        }
    }
}

/// In-memory invoice, tracking only what payments touch
#[derive(Debug, Clone, Copy, PartialEq)]
struct Invoice {
    paid_amount: Decimal,
    due_amount: Decimal,
    status: PaymentStatus,
}

impl Invoice {
    fn new(total: Decimal) -> Self {
        Self {
            paid_amount: Decimal::ZERO,
            due_amount: total,
            status: PaymentStatus::Unpaid,
        }
    }

    fn settle(&mut self, paid: Decimal, due: Decimal) {
        self.paid_amount = paid;
        self.due_amount = due;
        self.status = PaymentStatus::derive(paid, due);
    }
}

/// A recorded payment; the stored amount is the clamped payable
#[derive(Debug, Clone, Copy)]
struct Payment {
    direction: PaymentDirection,
    amount: Decimal,
}

/// Mirror of the service's create transaction
fn create_payment(
    account: &mut Account,
    invoice: Option<&mut Invoice>,
    direction: PaymentDirection,
    amount: Decimal,
) -> Result<Payment, &'static str> {
    let payable = match invoice {
        Some(invoice) => {
            if invoice.due_amount <= Decimal::ZERO {
                return Err("invoice is already fully paid");
            }
            let payable = amount.min(invoice.due_amount);
            invoice.settle(invoice.paid_amount + payable, invoice.due_amount - payable);
            payable
        }
        None => amount,
    };

    account.current_balance += direction.signed(payable);
    Ok(Payment { direction, amount: payable })
}

/// Mirror of the service's update transaction: reverse old, apply new
fn update_payment(
    account: &mut Account,
    invoice: Option<&mut Invoice>,
    payment: &mut Payment,
    new_amount: Decimal,
) {
    // Reverse the old impact
    account.current_balance -= payment.direction.signed(payment.amount);

    let payable = match invoice {
        Some(invoice) => {
            let paid = invoice.paid_amount - payment.amount;
            let due = invoice.due_amount + payment.amount;
            let payable = new_amount.min(due);
            invoice.settle(paid + payable, due - payable);
            payable
        }
        None => new_amount,
    };

    // Apply the new impact
    account.current_balance += payment.direction.signed(payable);
    payment.amount = payable;
}

/// Mirror of the service's remove transaction
fn remove_payment(account: &mut Account, invoice: Option<&mut Invoice>, payment: Payment) {
    account.current_balance -= payment.direction.signed(payment.amount);
    if let Some(invoice) = invoice {
        invoice.settle(
            invoice.paid_amount - payment.amount,
            invoice.due_amount + payment.amount,
        );
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_signed_amounts() {
        assert_eq!(PaymentDirection::In.signed(dec("100")), dec("100"));
        assert_eq!(PaymentDirection::Out.signed(dec("100")), dec("-100"));
    }

    #[test]
    fn test_inbound_payment_credits_account() {
        let mut account = Account::new(dec("1000"));
        create_payment(&mut account, None, PaymentDirection::In, dec("250")).unwrap();
        assert_eq!(account.current_balance, dec("1250"));
    }

    #[test]
    fn test_outbound_payment_debits_account() {
        let mut account = Account::new(dec("1000"));
        create_payment(&mut account, None, PaymentDirection::Out, dec("250")).unwrap();
        assert_eq!(account.current_balance, dec("750"));
    }

    #[test]
    fn test_payment_clamped_to_invoice_due() {
        let mut account = Account::new(dec("0"));
        let mut invoice = Invoice::new(dec("100"));

        let payment =
            create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, dec("150"))
                .unwrap();

        // Only the due amount is applied, to the account and the payment
        assert_eq!(payment.amount, dec("100"));
        assert_eq!(account.current_balance, dec("100"));
        assert_eq!(invoice.due_amount, Decimal::ZERO);
        assert_eq!(invoice.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_against_settled_invoice_fails() {
        let mut account = Account::new(dec("0"));
        let mut invoice = Invoice::new(dec("100"));
        create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, dec("100")).unwrap();

        let result =
            create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, dec("10"));
        assert!(result.is_err());
        assert_eq!(account.current_balance, dec("100"));
    }

    /// Updating a payment from X to Y moves the balance by
    /// exactly (Y - X) in the payment's direction
    #[test]
    fn test_update_is_pure_reversal_and_reapply() {
        let mut account = Account::new(dec("1000"));
        let mut payment =
            create_payment(&mut account, None, PaymentDirection::In, dec("300")).unwrap();
        assert_eq!(account.current_balance, dec("1300"));

        update_payment(&mut account, None, &mut payment, dec("120"));

        // 1000 + 120, never 1000 + 300 + 120
        assert_eq!(account.current_balance, dec("1120"));
        assert_eq!(payment.amount, dec("120"));
    }

    #[test]
    fn test_update_outbound_direction() {
        let mut account = Account::new(dec("1000"));
        let mut payment =
            create_payment(&mut account, None, PaymentDirection::Out, dec("300")).unwrap();
        assert_eq!(account.current_balance, dec("700"));

        update_payment(&mut account, None, &mut payment, dec("500"));
        assert_eq!(account.current_balance, dec("500"));
    }

    #[test]
    fn test_update_reclamps_against_invoice() {
        let mut account = Account::new(dec("0"));
        let mut invoice = Invoice::new(dec("100"));
        let mut payment =
            create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, dec("60"))
                .unwrap();

        // Raising the amount past the total re-clamps to the full due
        update_payment(&mut account, Some(&mut invoice), &mut payment, dec("500"));

        assert_eq!(payment.amount, dec("100"));
        assert_eq!(invoice.paid_amount, dec("100"));
        assert_eq!(invoice.due_amount, Decimal::ZERO);
        assert_eq!(invoice.status, PaymentStatus::Paid);
        assert_eq!(account.current_balance, dec("100"));
    }

    #[test]
    fn test_remove_reverses_everything() {
        let mut account = Account::new(dec("1000"));
        let mut invoice = Invoice::new(dec("100"));
        let payment =
            create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, dec("100"))
                .unwrap();
        assert_eq!(invoice.status, PaymentStatus::Paid);

        remove_payment(&mut account, Some(&mut invoice), payment);

        assert_eq!(account.current_balance, dec("1000"));
        assert_eq!(invoice.paid_amount, Decimal::ZERO);
        assert_eq!(invoice.due_amount, dec("100"));
        assert_eq!(invoice.status, PaymentStatus::Unpaid);
    }

    /// Invoice amount=100 tax=18 -> total 118 due 118 UNPAID;
    /// a payment of 118 drives it to PAID
    #[test]
    fn test_invoice_reconciliation_end_to_end() {
        let mut account = Account::new(dec("0"));
        let mut invoice = Invoice::new(dec("100") + dec("18"));
        assert_eq!(invoice.due_amount, dec("118"));
        assert_eq!(invoice.status, PaymentStatus::Unpaid);

        let payment =
            create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, dec("118"))
                .unwrap();

        assert_eq!(payment.amount, dec("118"));
        assert_eq!(invoice.paid_amount, dec("118"));
        assert_eq!(invoice.due_amount, Decimal::ZERO);
        assert_eq!(invoice.status, PaymentStatus::Paid);
        assert_eq!(account.current_balance, dec("118"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_00i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn direction_strategy() -> impl Strategy<Value = PaymentDirection> {
        prop_oneof![Just(PaymentDirection::In), Just(PaymentDirection::Out)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Update moves the balance by exactly (Y - X) in the direction
        #[test]
        fn prop_update_delta_law(
            opening in amount_strategy(),
            x in amount_strategy(),
            y in amount_strategy(),
            direction in direction_strategy()
        ) {
            let mut account = Account::new(opening);
            let mut payment = create_payment(&mut account, None, direction, x).unwrap();
            let after_create = account.current_balance;

            update_payment(&mut account, None, &mut payment, y);

            prop_assert_eq!(
                account.current_balance - after_create,
                direction.signed(y) - direction.signed(x)
            );
        }

        /// Create followed by remove restores the balance exactly
        #[test]
        fn prop_remove_is_inverse_of_create(
            opening in amount_strategy(),
            amount in amount_strategy(),
            direction in direction_strategy()
        ) {
            let mut account = Account::new(opening);
            let payment = create_payment(&mut account, None, direction, amount).unwrap();
            remove_payment(&mut account, None, payment);

            prop_assert_eq!(account.current_balance, opening);
        }

        /// With an invoice linked, create/remove also restores paid/due
        #[test]
        fn prop_remove_restores_invoice(
            total in amount_strategy(),
            amount in amount_strategy()
        ) {
            let mut account = Account::new(Decimal::ZERO);
            let mut invoice = Invoice::new(total);
            let before = invoice;

            let payment =
                create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, amount)
                    .unwrap();
            remove_payment(&mut account, Some(&mut invoice), payment);

            prop_assert_eq!(invoice, before);
            prop_assert_eq!(account.current_balance, Decimal::ZERO);
        }

        /// The account moves by the applied (clamped) amount, never the
        /// requested amount
        #[test]
        fn prop_account_moves_by_clamped_amount(
            total in amount_strategy(),
            requested in amount_strategy()
        ) {
            let mut account = Account::new(Decimal::ZERO);
            let mut invoice = Invoice::new(total);

            let payment =
                create_payment(&mut account, Some(&mut invoice), PaymentDirection::In, requested)
                    .unwrap();

            prop_assert_eq!(payment.amount, requested.min(total));
            prop_assert_eq!(account.current_balance, payment.amount);
        }

        /// Invoice status always matches its paid/due amounts
        #[test]
        fn prop_status_consistent_after_payments(
            total in amount_strategy(),
            amounts in prop::collection::vec(amount_strategy(), 1..8)
        ) {
            let mut account = Account::new(Decimal::ZERO);
            let mut invoice = Invoice::new(total);

            for amount in amounts {
                let _ = create_payment(
                    &mut account,
                    Some(&mut invoice),
                    PaymentDirection::In,
                    amount,
                );
                prop_assert_eq!(
                    invoice.status,
                    PaymentStatus::derive(invoice.paid_amount, invoice.due_amount)
                );
            }
        }
    }
}
