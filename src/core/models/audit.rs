use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lending event recorded in the audit trail.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserRegistered,
    ApplicationSubmitted,
    ApplicationApproved,
    ApplicationRejected,
    LenderAssigned,
    PaymentRecorded,
    LoanCompleted,
    ReviewSubmitted,
}

impl AuditAction {
    /// Actions that move money or change a loan's status.
    pub fn is_ledger_event(self) -> bool {
        matches!(
            self,
            AuditAction::ApplicationApproved
                | AuditAction::LenderAssigned
                | AuditAction::PaymentRecorded
                | AuditAction::LoanCompleted
        )
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::UserRegistered => "USER_REGISTERED",
            AuditAction::ApplicationSubmitted => "APPLICATION_SUBMITTED",
            AuditAction::ApplicationApproved => "APPLICATION_APPROVED",
            AuditAction::ApplicationRejected => "APPLICATION_REJECTED",
            AuditAction::LenderAssigned => "LENDER_ASSIGNED",
            AuditAction::PaymentRecorded => "PAYMENT_RECORDED",
            AuditAction::LoanCompleted => "LOAN_COMPLETED",
            AuditAction::ReviewSubmitted => "REVIEW_SUBMITTED",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppLog {
    pub id: String,
    pub action: AuditAction,
    pub user_id: Option<String>,
    /// Loan, application, review or user the entry is about.
    pub subject_id: String,
    pub details: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
