//! Loan lifecycle transitions.
//!
//! These functions mutate in-memory entities only. Callers are responsible for
//! committing the touched records together (see `Storage::commit_approval` and
//! `Storage::commit_payment`).

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::errors::LendingError;
use crate::core::ledger;
use crate::core::models::{Loan, LoanApplication, LoanStatus, Payment, Transaction};

const APPLICATION: &str = "loan application";
const LOAN: &str = "loan";

/// Turns a pending application into an approved loan carrying its terms.
pub fn approve(
    application: &mut LoanApplication,
    lender_id: Option<String>,
    interest_rate: f64,
    now: DateTime<Utc>,
) -> Result<Loan, LendingError> {
    if !interest_rate.is_finite() || interest_rate < 0.0 {
        return Err(LendingError::invalid_input(
            "interest_rate",
            "Invalid Interest Rate",
            "Interest rate must be a non-negative number",
        ));
    }
    if interest_rate > ledger::MAX_INTEREST_RATE {
        return Err(LendingError::invalid_input(
            "interest_rate",
            "Interest Rate Too Large",
            format!("Interest rate must not exceed {}%", ledger::MAX_INTEREST_RATE),
        ));
    }

    let loan = Loan {
        id: Uuid::new_v4().to_string(),
        application_id: application.id.clone(),
        borrower_id: application.borrower_id.clone(),
        lender_id,
        amount_requested: application.amount_requested,
        interest_rate,
        duration_in_months: application.duration_in_months,
        collateral: application.collateral.clone(),
        status: LoanStatus::Approved,
        created_at: now,
        updated_at: now,
        version: 0,
    };
    // Terms whose balance cannot be computed are refused before the status moves.
    ledger::owed_amount(&loan)?;
    application
        .status
        .transition(LoanStatus::Approved, APPLICATION, &application.id, "approve")?;
    application.updated_at = now;
    debug!("Application {} approved as loan {}", application.id, loan.id);
    Ok(loan)
}

pub fn reject(application: &mut LoanApplication, now: DateTime<Utc>) -> Result<(), LendingError> {
    application
        .status
        .transition(LoanStatus::Rejected, APPLICATION, &application.id, "reject")?;
    application.updated_at = now;
    Ok(())
}

/// Funds an approved loan that has no lender yet.
pub fn assign_lender(loan: &mut Loan, lender_id: &str, now: DateTime<Utc>) -> Result<(), LendingError> {
    if loan.status != LoanStatus::Approved || loan.lender_id.is_some() {
        return Err(LendingError::InvalidState {
            entity: LOAN,
            id: loan.id.clone(),
            status: loan.status,
            action: "assign a lender to",
        });
    }
    loan.lender_id = Some(lender_id.to_string());
    loan.updated_at = now;
    Ok(())
}

/// Creates the single repayment record of a funded loan.
pub fn open_transaction(loan: &Loan, now: DateTime<Utc>) -> Result<Transaction, LendingError> {
    let lender_id = match (&loan.status, &loan.lender_id) {
        (LoanStatus::Approved, Some(lender_id)) => lender_id.clone(),
        (LoanStatus::Completed, _) => return Err(LendingError::AlreadyRepaid(loan.id.clone())),
        _ => {
            return Err(LendingError::InvalidState {
                entity: LOAN,
                id: loan.id.clone(),
                status: loan.status,
                action: "record a payment on",
            });
        }
    };
    Ok(Transaction {
        id: Uuid::new_v4().to_string(),
        loan_id: loan.id.clone(),
        lender_id,
        borrower_id: loan.borrower_id.clone(),
        amount: Decimal::ZERO,
        transaction_date: now,
        is_repaid: false,
        payments: Vec::new(),
        version: 0,
    })
}

/// Outcome of a payment: whether it completed the loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Partial,
    Completed,
}

/// Adds `amount` to the running total and completes the loan once the owed
/// amount is covered.
pub fn record_payment(
    transaction: &mut Transaction,
    loan: &mut Loan,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<PaymentOutcome, LendingError> {
    if amount <= Decimal::ZERO {
        return Err(LendingError::invalid_input(
            "amount",
            "Invalid Amount",
            "Transaction amount must be greater than zero",
        ));
    }
    if loan.status == LoanStatus::Completed || ledger::is_completed(loan, transaction.amount)? {
        return Err(LendingError::AlreadyRepaid(loan.id.clone()));
    }
    if loan.status != LoanStatus::Approved {
        return Err(LendingError::InvalidState {
            entity: LOAN,
            id: loan.id.clone(),
            status: loan.status,
            action: "record a payment on",
        });
    }

    transaction.amount += amount;
    transaction.transaction_date = now;
    transaction.payments.push(Payment {
        id: Uuid::new_v4().to_string(),
        amount,
        paid_at: now,
    });
    transaction.is_repaid = ledger::is_completed(loan, transaction.amount)?;

    if !transaction.is_repaid {
        return Ok(PaymentOutcome::Partial);
    }
    loan.status
        .transition(LoanStatus::Completed, LOAN, &loan.id, "complete")?;
    loan.updated_at = now;
    debug!("Loan {} fully repaid with {}", loan.id, transaction.amount);
    Ok(PaymentOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_application() -> LoanApplication {
        let now = Utc::now();
        LoanApplication {
            id: "app-1".to_string(),
            borrower_id: "borrower".to_string(),
            amount_requested: dec!(1000),
            purpose: "Inventory".to_string(),
            duration_in_months: 12,
            collateral: Some("Delivery van".to_string()),
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
            version: 3,
        }
    }

    fn funded_loan() -> (Transaction, Loan) {
        let mut application = pending_application();
        let loan = approve(&mut application, Some("lender".to_string()), 5.0, Utc::now()).unwrap();
        let tx = open_transaction(&loan, Utc::now()).unwrap();
        (tx, loan)
    }

    #[test]
    fn approve_copies_terms_and_flips_status() {
        let mut application = pending_application();
        let loan = approve(&mut application, None, 5.0, Utc::now()).unwrap();

        assert_eq!(application.status, LoanStatus::Approved);
        assert_eq!(loan.status, LoanStatus::Approved);
        assert_eq!(loan.application_id, application.id);
        assert_eq!(loan.borrower_id, "borrower");
        assert_eq!(loan.amount_requested, dec!(1000));
        assert_eq!(loan.duration_in_months, 12);
        assert_eq!(loan.collateral.as_deref(), Some("Delivery van"));
        assert_eq!(loan.lender_id, None);
    }

    #[test]
    fn approve_twice_fails() {
        let mut application = pending_application();
        approve(&mut application, None, 5.0, Utc::now()).unwrap();
        let err = approve(&mut application, None, 5.0, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LendingError::InvalidState { status: LoanStatus::Approved, .. }
        ));
    }

    #[test]
    fn approve_rejects_negative_rate_without_touching_status() {
        let mut application = pending_application();
        let err = approve(&mut application, None, -1.0, Utc::now()).unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput(..)));
        assert_eq!(application.status, LoanStatus::Pending);
    }

    #[test]
    fn approve_caps_the_rate() {
        let mut application = pending_application();
        let err = approve(&mut application, None, 1e22, Utc::now()).unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput(field, _) if field == "interest_rate"));
        assert_eq!(application.status, LoanStatus::Pending);

        let loan = approve(&mut application, None, ledger::MAX_INTEREST_RATE, Utc::now()).unwrap();
        assert_eq!(loan.interest_rate, 100.0);
    }

    #[test]
    fn rejected_application_is_terminal() {
        let mut application = pending_application();
        reject(&mut application, Utc::now()).unwrap();
        assert_eq!(application.status, LoanStatus::Rejected);

        assert!(reject(&mut application, Utc::now()).is_err());
        let err = approve(&mut application, None, 5.0, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LendingError::InvalidState { status: LoanStatus::Rejected, .. }
        ));
    }

    #[test]
    fn open_transaction_needs_a_lender() {
        let mut application = pending_application();
        let loan = approve(&mut application, None, 5.0, Utc::now()).unwrap();
        assert!(matches!(
            open_transaction(&loan, Utc::now()),
            Err(LendingError::InvalidState { .. })
        ));
    }

    #[test]
    fn assign_lender_only_once() {
        let mut application = pending_application();
        let mut loan = approve(&mut application, None, 5.0, Utc::now()).unwrap();
        assign_lender(&mut loan, "lender", Utc::now()).unwrap();
        assert_eq!(loan.lender_id.as_deref(), Some("lender"));
        assert!(assign_lender(&mut loan, "other", Utc::now()).is_err());
    }

    #[test]
    fn exact_payment_completes_loan() {
        let (mut tx, mut loan) = funded_loan();
        let outcome = record_payment(&mut tx, &mut loan, dec!(1050), Utc::now()).unwrap();
        assert_eq!(outcome, PaymentOutcome::Completed);
        assert!(tx.is_repaid);
        assert_eq!(loan.status, LoanStatus::Completed);
    }

    #[test]
    fn one_cent_short_stays_open() {
        let (mut tx, mut loan) = funded_loan();
        let outcome = record_payment(&mut tx, &mut loan, dec!(1049.99), Utc::now()).unwrap();
        assert_eq!(outcome, PaymentOutcome::Partial);
        assert!(!tx.is_repaid);
        assert_eq!(loan.status, LoanStatus::Approved);

        record_payment(&mut tx, &mut loan, dec!(0.01), Utc::now()).unwrap();
        assert!(tx.is_repaid);
        assert_eq!(tx.amount, dec!(1050));
        assert_eq!(tx.payments.len(), 2);
    }

    #[test]
    fn payment_after_completion_is_refused() {
        let (mut tx, mut loan) = funded_loan();
        record_payment(&mut tx, &mut loan, dec!(2000), Utc::now()).unwrap();
        let err = record_payment(&mut tx, &mut loan, dec!(1), Utc::now()).unwrap_err();
        assert_eq!(err, LendingError::AlreadyRepaid(loan.id.clone()));
        assert_eq!(tx.payments.len(), 1);
    }

    #[test]
    fn non_positive_payment_is_invalid() {
        let (mut tx, mut loan) = funded_loan();
        for amount in [Decimal::ZERO, dec!(-5)] {
            let err = record_payment(&mut tx, &mut loan, amount, Utc::now()).unwrap_err();
            assert!(matches!(err, LendingError::InvalidInput(field, _) if field == "amount"));
        }
        assert_eq!(tx.amount, Decimal::ZERO);
    }
}
