//! Custom test assertions
//!
//! Assertion helpers for domain types that give more meaningful error
//! messages than standard assertions.

use core_kernel::Money;
use rust_decimal::Decimal;

use domain_claims::Indemnification;

/// Asserts that two Money values have the same currency and amount
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Money amounts differ: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts the roll-up invariant of an indemnification: its amount (local
/// amount when computed in a foreign currency) equals the currency-rounded
/// sum of its detail line amounts
pub fn assert_rolled_up(indemnification: &Indemnification) {
    let total: Decimal = indemnification
        .details
        .iter()
        .map(|detail| detail.amount())
        .sum();

    let rolled_up = match indemnification.local_amount {
        Some(local) => local,
        None => indemnification.amount,
    };
    let expected = Money::new(total, rolled_up.currency()).round_to_currency();

    assert_eq!(
        rolled_up, expected,
        "Roll-up mismatch: indemnification carries {}, details sum to {}",
        rolled_up, expected
    );
}
