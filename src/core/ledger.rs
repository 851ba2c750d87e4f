//! Balance arithmetic for a loan.
//!
//! Interest is flat: the borrower owes the principal plus `interest_rate`
//! percent of it, regardless of duration. Amounts are kept to two decimal
//! places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::core::errors::LendingError;
use crate::core::models::Loan;

const MONEY_SCALE: u32 = 2;

/// Highest interest rate, in percent, a loan may be approved at.
pub const MAX_INTEREST_RATE: f64 = 100.0;

fn rate_as_decimal(interest_rate: f64) -> Result<Decimal, LendingError> {
    if !interest_rate.is_finite() {
        return Err(LendingError::invalid_input(
            "interest_rate",
            "Invalid Interest Rate",
            "Interest rate must be a finite number",
        ));
    }
    Decimal::try_from(interest_rate).map_err(|e| {
        LendingError::invalid_input("interest_rate", "Invalid Interest Rate", e.to_string())
    })
}

/// Principal plus interest: `amount_requested * (1 + interest_rate / 100)`.
pub fn owed_amount(loan: &Loan) -> Result<Decimal, LendingError> {
    let rate = rate_as_decimal(loan.interest_rate)?;
    let owed = loan
        .amount_requested
        .checked_mul(rate)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .and_then(|interest| loan.amount_requested.checked_add(interest))
        .ok_or_else(|| {
            LendingError::invalid_input(
                "interest_rate",
                "Interest Rate Too Large",
                format!("Interest at {}% on {} cannot be represented", loan.interest_rate, loan.amount_requested),
            )
        })?;
    Ok(owed.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Negative when the loan has been overpaid.
pub fn remaining_balance(loan: &Loan, total_paid: Decimal) -> Result<Decimal, LendingError> {
    Ok(owed_amount(loan)? - total_paid)
}

pub fn is_completed(loan: &Loan, total_paid: Decimal) -> Result<bool, LendingError> {
    Ok(remaining_balance(loan, total_paid)? <= Decimal::ZERO)
}

/// Clamped view of a loan's balance for presentation.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LoanStatement {
    pub loan_id: String,
    pub owed: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub overpaid: Decimal,
    pub completed: bool,
}

pub fn statement(loan: &Loan, total_paid: Decimal) -> Result<LoanStatement, LendingError> {
    let owed = owed_amount(loan)?;
    let remaining = owed - total_paid;
    Ok(LoanStatement {
        loan_id: loan.id.clone(),
        owed,
        paid: total_paid,
        remaining: remaining.max(Decimal::ZERO),
        overpaid: (-remaining).max(Decimal::ZERO),
        completed: remaining <= Decimal::ZERO,
    })
}
