use crate::core::errors::LendingError;
use crate::core::models::{Loan, LoanApplication, LoanStatus, Review, Transaction, User};
use async_trait::async_trait;

/// Filter for application lookups; `None` fields match everything.
#[derive(Clone, Debug, Default)]
pub struct ApplicationCriteria {
    pub borrower_id: Option<String>,
    pub status: Option<LoanStatus>,
}

impl ApplicationCriteria {
    pub fn matches(&self, application: &LoanApplication) -> bool {
        self.borrower_id
            .as_deref()
            .is_none_or(|id| application.borrower_id == id)
            && self.status.is_none_or(|s| application.status == s)
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoanCriteria {
    pub borrower_id: Option<String>,
    pub lender_id: Option<String>,
    pub status: Option<LoanStatus>,
}

impl LoanCriteria {
    pub fn matches(&self, loan: &Loan) -> bool {
        self.borrower_id.as_deref().is_none_or(|id| loan.borrower_id == id)
            && self
                .lender_id
                .as_deref()
                .is_none_or(|id| loan.lender_id.as_deref() == Some(id))
            && self.status.is_none_or(|s| loan.status == s)
    }
}

/// Persistence collaborator.
///
/// Versioned records (`LoanApplication`, `Loan`, `Transaction`) are written
/// optimistically: the `version` on the passed record must equal the stored
/// one, otherwise the write fails with `LendingError::Conflict`. Successful
/// writes return the record with its version bumped. The `commit_*` methods
/// apply all of their records or none.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, LendingError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, LendingError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LendingError>;

    async fn create_application(&self, application: LoanApplication) -> Result<LoanApplication, LendingError>;
    async fn get_application(&self, application_id: &str) -> Result<Option<LoanApplication>, LendingError>;
    async fn update_application(&self, application: LoanApplication) -> Result<LoanApplication, LendingError>;
    async fn find_applications(&self, criteria: &ApplicationCriteria) -> Result<Vec<LoanApplication>, LendingError>;

    async fn get_loan(&self, loan_id: &str) -> Result<Option<Loan>, LendingError>;
    async fn update_loan(&self, loan: Loan) -> Result<Loan, LendingError>;
    async fn find_loans(&self, criteria: &LoanCriteria) -> Result<Vec<Loan>, LendingError>;

    async fn get_transaction_by_loan(&self, loan_id: &str) -> Result<Option<Transaction>, LendingError>;

    /// Inserts the review and replaces the reviewed user's rating with the
    /// mean of their full review set, including reviews committed
    /// concurrently. Returns the review and the updated user.
    async fn create_review_and_rate(&self, review: Review) -> Result<(Review, User), LendingError>;
    async fn get_reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>, LendingError>;

    /// Persists the approved application and the new loan together and
    /// increments the borrower's `number_of_loans`.
    async fn commit_approval(
        &self,
        application: LoanApplication,
        loan: Loan,
    ) -> Result<(LoanApplication, Loan), LendingError>;

    /// Persists a payment: the transaction (inserted when no record exists yet
    /// for the loan and its version is 0) and the loan. When the loan moves to
    /// COMPLETED the borrower's `number_of_loans_repaid` is incremented in the
    /// same commit.
    async fn commit_payment(
        &self,
        transaction: Transaction,
        loan: Loan,
    ) -> Result<(Transaction, Loan), LendingError>;
}

pub mod in_memory;
