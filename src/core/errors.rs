use serde::Serialize;
use thiserror::Error;

use crate::core::models::status::LoanStatus;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Why a borrower was refused by the eligibility policy.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    TooManyOutstandingLoans { approved: usize, max: usize },
    InsufficientRepaymentHistory { repaid: usize, min: usize },
}

impl std::fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibilityReason::TooManyOutstandingLoans { approved, max } => write!(
                f,
                "borrower has too many loans ({} approved, limit {})",
                approved, max
            ),
            IneligibilityReason::InsufficientRepaymentHistory { repaid, min } => write!(
                f,
                "borrower hasn't repaid enough loans ({} repaid, {} required)",
                repaid, min
            ),
        }
    }
}

#[derive(Error, Debug, Serialize, Clone, PartialEq)]
pub enum LendingError {
    /// Malformed input: non-positive amount or duration, rating outside 1-5, ...
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Operation attempted on an entity that is not in the required state
    #[error("Cannot {action} {entity} {id} in status {status}")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: LoanStatus,
        action: &'static str,
    },

    /// Payment against a loan that is already fully repaid
    #[error("Loan {0} is already fully repaid")]
    AlreadyRepaid(String),

    /// Borrower fails the eligibility policy
    #[error("Borrower not eligible: {0}")]
    NotEligible(IneligibilityReason),

    /// Actor lacks the required role or ownership
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Loan application {0} not found")]
    ApplicationNotFound(String),

    #[error("Loan {0} not found")]
    LoanNotFound(String),

    /// A concurrent writer committed first; reload and retry
    #[error("Concurrent modification of {0}")]
    Conflict(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl LendingError {
    pub fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        LendingError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}
