use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::errors::{IneligibilityReason, LendingError};
use crate::core::models::{Loan, LoanApplication, LoanStatus};

pub const DEFAULT_MAX_APPROVED_APPLICATIONS: usize = 5;
pub const DEFAULT_MIN_REPAID_LOANS: usize = 3;

/// Thresholds gating approval of a borrower's next application.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EligibilityPolicy {
    /// Approval is refused once the borrower has more approved applications than this.
    pub max_approved_applications: usize,
    /// Approval is refused while the borrower has repaid fewer loans than this.
    pub min_repaid_loans: usize,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        EligibilityPolicy {
            max_approved_applications: DEFAULT_MAX_APPROVED_APPLICATIONS,
            min_repaid_loans: DEFAULT_MIN_REPAID_LOANS,
        }
    }
}

/// Counts derived from a borrower's applications and loans.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct BorrowerHistory {
    pub approved_applications: usize,
    pub repaid: usize,
}

impl BorrowerHistory {
    /// A repaid application is one that is COMPLETED itself or whose loan is COMPLETED.
    pub fn from_records(applications: &[LoanApplication], loans: &[Loan]) -> Self {
        let approved_applications = applications
            .iter()
            .filter(|a| a.status == LoanStatus::Approved)
            .count();
        let repaid: HashSet<&str> = applications
            .iter()
            .filter(|a| a.status == LoanStatus::Completed)
            .map(|a| a.id.as_str())
            .chain(
                loans
                    .iter()
                    .filter(|l| l.status == LoanStatus::Completed)
                    .map(|l| l.application_id.as_str()),
            )
            .collect();
        BorrowerHistory {
            approved_applications,
            repaid: repaid.len(),
        }
    }
}

impl EligibilityPolicy {
    pub fn evaluate(&self, history: &BorrowerHistory) -> Result<(), LendingError> {
        if history.approved_applications > self.max_approved_applications {
            return Err(LendingError::NotEligible(
                IneligibilityReason::TooManyOutstandingLoans {
                    approved: history.approved_applications,
                    max: self.max_approved_applications,
                },
            ));
        }
        if history.repaid < self.min_repaid_loans {
            return Err(LendingError::NotEligible(
                IneligibilityReason::InsufficientRepaymentHistory {
                    repaid: history.repaid,
                    min: self.min_repaid_loans,
                },
            ));
        }
        Ok(())
    }
}
