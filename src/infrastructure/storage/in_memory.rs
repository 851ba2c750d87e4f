use crate::core::errors::LendingError;
use crate::core::models::{Loan, LoanApplication, LoanStatus, Review, Transaction, User};
use crate::core::reputation;
use crate::infrastructure::storage::{ApplicationCriteria, LoanCriteria, Storage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    emails: HashMap<String, String>, // email -> user_id
    applications: HashMap<String, LoanApplication>,
    loans: HashMap<String, Loan>,
    transactions: HashMap<String, Transaction>, // loan_id -> transaction
    reviews: Vec<Review>,
}

/// All tables sit behind one lock so every commit is atomic.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(what: &str, id: &str, stored: Option<u64>, incoming: u64) -> Result<(), LendingError> {
    match stored {
        Some(v) if v == incoming => Ok(()),
        Some(_) => Err(LendingError::Conflict(format!("{} {}", what, id))),
        None => Err(LendingError::StorageError(format!("{} {} does not exist", what, id))),
    }
}

impl Tables {
    fn check_application(&self, application: &LoanApplication) -> Result<(), LendingError> {
        check_version(
            "loan application",
            &application.id,
            self.applications.get(&application.id).map(|a| a.version),
            application.version,
        )
    }

    fn check_loan(&self, loan: &Loan) -> Result<(), LendingError> {
        check_version("loan", &loan.id, self.loans.get(&loan.id).map(|l| l.version), loan.version)
    }

    fn user_mut(&mut self, user_id: &str) -> Result<&mut User, LendingError> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| LendingError::UserNotFound(user_id.to_string()))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, LendingError> {
        let mut tables = self.tables.write().await;
        if tables.emails.contains_key(&user.email) {
            return Err(LendingError::EmailAlreadyRegistered(user.email));
        }
        if tables.users.contains_key(&user.id) {
            return Err(LendingError::StorageError(format!("user {} already exists", user.id)));
        }
        tables.emails.insert(user.email.clone(), user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, LendingError> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LendingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create_application(&self, mut application: LoanApplication) -> Result<LoanApplication, LendingError> {
        let mut tables = self.tables.write().await;
        if tables.applications.contains_key(&application.id) {
            return Err(LendingError::StorageError(format!(
                "loan application {} already exists",
                application.id
            )));
        }
        application.version = 1;
        tables.applications.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn get_application(&self, application_id: &str) -> Result<Option<LoanApplication>, LendingError> {
        Ok(self.tables.read().await.applications.get(application_id).cloned())
    }

    async fn update_application(&self, mut application: LoanApplication) -> Result<LoanApplication, LendingError> {
        let mut tables = self.tables.write().await;
        tables.check_application(&application)?;
        application.version += 1;
        tables.applications.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn find_applications(&self, criteria: &ApplicationCriteria) -> Result<Vec<LoanApplication>, LendingError> {
        let tables = self.tables.read().await;
        let mut found: Vec<LoanApplication> = tables
            .applications
            .values()
            .filter(|a| criteria.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn get_loan(&self, loan_id: &str) -> Result<Option<Loan>, LendingError> {
        Ok(self.tables.read().await.loans.get(loan_id).cloned())
    }

    async fn update_loan(&self, mut loan: Loan) -> Result<Loan, LendingError> {
        let mut tables = self.tables.write().await;
        tables.check_loan(&loan)?;
        loan.version += 1;
        tables.loans.insert(loan.id.clone(), loan.clone());
        Ok(loan)
    }

    async fn find_loans(&self, criteria: &LoanCriteria) -> Result<Vec<Loan>, LendingError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Loan> = tables
            .loans
            .values()
            .filter(|l| criteria.matches(l))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn get_transaction_by_loan(&self, loan_id: &str) -> Result<Option<Transaction>, LendingError> {
        Ok(self.tables.read().await.transactions.get(loan_id).cloned())
    }

    async fn create_review_and_rate(&self, review: Review) -> Result<(Review, User), LendingError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let user = tables
            .users
            .get_mut(&review.reviewed_user_id)
            .ok_or_else(|| LendingError::UserNotFound(review.reviewed_user_id.clone()))?;
        tables.reviews.push(review.clone());
        reputation::recompute_rating(user, &tables.reviews);
        Ok((review, user.clone()))
    }

    async fn get_reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>, LendingError> {
        Ok(self
            .tables
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.reviewed_user_id == user_id)
            .cloned()
            .collect())
    }

    async fn commit_approval(
        &self,
        mut application: LoanApplication,
        mut loan: Loan,
    ) -> Result<(LoanApplication, Loan), LendingError> {
        let mut tables = self.tables.write().await;
        tables.check_application(&application)?;
        if tables.loans.contains_key(&loan.id) {
            return Err(LendingError::StorageError(format!("loan {} already exists", loan.id)));
        }
        // Validate everything before the first write.
        tables.user_mut(&loan.borrower_id)?;

        application.version += 1;
        loan.version = 1;
        tables.user_mut(&loan.borrower_id)?.number_of_loans += 1;
        tables.applications.insert(application.id.clone(), application.clone());
        tables.loans.insert(loan.id.clone(), loan.clone());
        Ok((application, loan))
    }

    async fn commit_payment(
        &self,
        mut transaction: Transaction,
        mut loan: Loan,
    ) -> Result<(Transaction, Loan), LendingError> {
        let mut tables = self.tables.write().await;
        tables.check_loan(&loan)?;
        match tables.transactions.get(&loan.id) {
            Some(stored) if stored.version != transaction.version => {
                return Err(LendingError::Conflict(format!("transaction {}", stored.id)));
            }
            None if transaction.version != 0 => {
                return Err(LendingError::Conflict(format!("transaction {}", transaction.id)));
            }
            _ => {}
        }
        if transaction.loan_id != loan.id {
            return Err(LendingError::StorageError(format!(
                "transaction {} does not belong to loan {}",
                transaction.id, loan.id
            )));
        }
        let completes = loan.status == LoanStatus::Completed
            && tables.loans.get(&loan.id).map(|l| l.status) != Some(LoanStatus::Completed);
        if completes {
            tables.user_mut(&loan.borrower_id)?.number_of_loans_repaid += 1;
        }

        transaction.version += 1;
        loan.version += 1;
        tables.transactions.insert(loan.id.clone(), transaction.clone());
        tables.loans.insert(loan.id.clone(), loan.clone());
        Ok((transaction, loan))
    }
}
