//! Custom Test Assertions
//!
//! Ledger invariant checks that print the offending numbers instead of a
//! bare `assertion failed`.

use core_kernel::Money;
use domain_investment::{Investment, InvestmentStatus, PaymentSchedule};
use domain_property::Property;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that money values sum to a total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = parts.iter().fold(Money::zero(total.currency()), |acc, m| {
        acc.checked_add(m).expect("Currency mismatch in sum")
    });

    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Asserts that every share of `property` is either available or held by a
/// non-cancelled investment in `investments`
///
/// `investments` must be every investment recorded against the property.
pub fn assert_share_conservation(property: &Property, investments: &[Investment]) {
    let held: u32 = investments
        .iter()
        .filter(|i| i.property_id() == property.id() && !i.is_cancelled())
        .map(|i| i.shares_invested())
        .sum();

    assert_eq!(
        property.available_shares() + held,
        property.total_shares(),
        "Share conservation violated on {}: available={} + held={} != total={}",
        property.id(),
        property.available_shares(),
        held,
        property.total_shares()
    );
    assert_eq!(
        property.shares_sold(),
        held,
        "shares_sold={} disagrees with shares held by investments={}",
        property.shares_sold(),
        held
    );
}

/// Asserts that `investment` is Completed exactly when its down payment and
/// every installment are paid
pub fn assert_completion_invariant(investment: &Investment) {
    if investment.is_cancelled() {
        return;
    }
    let fully_paid = investment.down_payment_paid()
        && investment.installments().iter().all(|i| i.is_paid());

    assert_eq!(
        investment.status() == InvestmentStatus::Completed,
        fully_paid,
        "Investment {} is {:?} but fully_paid={} (down payment paid={}, installments paid={}/{})",
        investment.id(),
        investment.status(),
        fully_paid,
        investment.down_payment_paid(),
        investment.paid_installments_count(),
        investment.installments().len()
    );
}

/// Asserts that schedule lines are ordered by due date
pub fn assert_schedule_sorted(schedule: &PaymentSchedule) {
    for pair in schedule.items.windows(2) {
        assert!(
            pair[0].due_date <= pair[1].due_date,
            "Schedule out of order: {} listed before {}",
            pair[0].due_date,
            pair[1].due_date
        );
    }
}
