use serde::{Deserialize, Serialize};

use crate::core::errors::LendingError;

/// Lifecycle status shared by loan applications and loans.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", s)
    }
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Completed)
    }

    /// The only legal edges are PENDING -> APPROVED | REJECTED and APPROVED -> COMPLETED.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Approved)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Approved, LoanStatus::Completed)
        )
    }

    /// Moves `self` to `next`, reporting the offending entity on an illegal edge.
    pub fn transition(
        &mut self,
        next: LoanStatus,
        entity: &'static str,
        id: &str,
        action: &'static str,
    ) -> Result<(), LendingError> {
        if !self.can_transition_to(next) {
            return Err(LendingError::InvalidState {
                entity,
                id: id.to_string(),
                status: *self,
                action,
            });
        }
        *self = next;
        Ok(())
    }
}
