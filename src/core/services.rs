use crate::auth::Actor;
use crate::config::DEFAULT_INTEREST_RATE;
use crate::constants::{MAX_NAME_LENGTH, MAX_PHONE_LENGTH, MAX_PURPOSE_LENGTH, MAX_TEXT_LENGTH};
use crate::core::eligibility::{BorrowerHistory, EligibilityPolicy};
use crate::core::errors::LendingError;
use crate::core::ledger::{self, LoanStatement};
use crate::core::lifecycle::{self, PaymentOutcome};
use crate::core::models::{AppLog, AuditAction, Loan, LoanApplication, LoanStatus, Review, Role, Transaction, User};
use crate::core::reputation;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::{ApplicationCriteria, LoanCriteria, Storage};
use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Largest amount a single application or payment may carry.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2); // 99_999_999.99

/// Input for registering a marketplace user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub roles: BTreeSet<Role>,
    pub is_staff: bool,
}

/// Input for a borrower's loan request.
#[derive(Clone, Debug)]
pub struct NewApplication {
    pub amount_requested: Decimal,
    pub purpose: String,
    pub duration_in_months: u32,
    pub collateral: Option<String>,
}

pub struct LendingService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    policy: EligibilityPolicy,
    default_interest_rate: f64,
}

impl<L: LoggingService, S: Storage> LendingService<L, S> {
    pub fn new(storage: S, logging: L) -> Self {
        Self::with_policy(storage, logging, EligibilityPolicy::default(), DEFAULT_INTEREST_RATE)
    }

    pub fn with_policy(storage: S, logging: L, policy: EligibilityPolicy, default_interest_rate: f64) -> Self {
        info!(
            "Initializing LendingService (max approved {}, min repaid {}, default rate {}%)",
            policy.max_approved_applications, policy.min_repaid_loans, default_interest_rate
        );
        LendingService {
            storage,
            logging,
            policy,
            default_interest_rate,
        }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    /// Audits a change that storage has already committed. A failed audit
    /// write is logged and swallowed: surfacing it would make callers retry
    /// an operation that already took effect.
    async fn log_and_audit(
        &self,
        action: AuditAction,
        subject_id: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) {
        if let Err(e) = self.logging.log_action(action, subject_id, details, user_id).await {
            warn!("Audit entry {} for {} was not recorded: {}", action, subject_id, e);
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LendingError> {
        if value.trim().is_empty() {
            return Err(LendingError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(LendingError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
            return Err(LendingError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_optional_text(&self, field: &str, value: &Option<String>) -> Result<(), LendingError> {
        match value {
            Some(text) => self.validate_string_input(field, text, MAX_TEXT_LENGTH),
            None => Ok(()),
        }
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<(), LendingError> {
        if amount <= Decimal::ZERO {
            return Err(LendingError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(LendingError::invalid_input(
                field,
                "Amount Too Large",
                format!("Amount cannot exceed {}", MAX_AMOUNT),
            ));
        }
        if amount.normalize().scale() > 2 {
            return Err(LendingError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), LendingError> {
        let valid = email.len() >= 5
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(LendingError::invalid_input(
                "email",
                "Invalid email",
                format!("{} is not a valid email address", email),
            ));
        }
        Ok(())
    }

    async fn require_user(&self, user_id: &str) -> Result<User, LendingError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| LendingError::UserNotFound(user_id.to_string()))
    }

    async fn require_application(&self, application_id: &str) -> Result<LoanApplication, LendingError> {
        self.storage
            .get_application(application_id)
            .await?
            .ok_or_else(|| LendingError::ApplicationNotFound(application_id.to_string()))
    }

    async fn require_loan(&self, loan_id: &str) -> Result<Loan, LendingError> {
        self.storage
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| LendingError::LoanNotFound(loan_id.to_string()))
    }

    // USERS

    pub async fn register_user(&self, new_user: NewUser) -> Result<User, LendingError> {
        info!("Registering user {}", new_user.username);
        self.validate_string_input("username", &new_user.username, MAX_NAME_LENGTH)?;
        self.validate_email(&new_user.email)?;
        if let Some(phone) = &new_user.phone_number {
            self.validate_string_input("phone_number", phone, MAX_PHONE_LENGTH)?;
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            email: new_user.email,
            phone_number: new_user.phone_number,
            rating: 0.0,
            number_of_loans: 0,
            number_of_loans_repaid: 0,
            roles: new_user.roles,
            is_staff: new_user.is_staff,
            created_at: Utc::now(),
        };
        let created = self.storage.create_user(user).await?;
        debug!("User created with ID: {}", created.id);

        self.log_and_audit(
            AuditAction::UserRegistered,
            &created.id,
            json!({
                "user_id": created.id,
                "username": created.username,
                "roles": created.roles,
                "is_staff": created.is_staff,
            }),
            Some(created.id.as_str()),
        )
        .await;
        Ok(created)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, LendingError> {
        self.storage.get_user(user_id).await
    }

    /// Loads the user's capabilities once so later checks never hit storage.
    pub async fn resolve_actor(&self, user_id: &str) -> Result<Actor, LendingError> {
        self.require_user(user_id).await.map(|u| Actor::from_user(&u))
    }

    // APPLICATIONS

    pub async fn submit_application(
        &self,
        actor: &Actor,
        request: NewApplication,
    ) -> Result<LoanApplication, LendingError> {
        info!(
            "User {} applying for {} over {} months",
            actor.user_id, request.amount_requested, request.duration_in_months
        );
        actor.require_role(Role::Borrower, "apply for a loan")?;
        self.validate_amount_input("amount_requested", request.amount_requested)?;
        if request.duration_in_months == 0 {
            return Err(LendingError::invalid_input(
                "duration_in_months",
                "Invalid Duration",
                "Duration must be greater than zero",
            ));
        }
        self.validate_string_input("purpose", &request.purpose, MAX_PURPOSE_LENGTH)?;
        self.validate_optional_text("collateral", &request.collateral)?;
        self.require_user(&actor.user_id).await?;

        let now = Utc::now();
        let application = LoanApplication {
            id: Uuid::new_v4().to_string(),
            borrower_id: actor.user_id.clone(),
            amount_requested: request.amount_requested,
            purpose: request.purpose,
            duration_in_months: request.duration_in_months,
            collateral: request.collateral,
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        let created = self.storage.create_application(application).await?;
        debug!("Application created with ID: {}", created.id);

        self.log_and_audit(
            AuditAction::ApplicationSubmitted,
            &created.id,
            json!({
                "application_id": created.id,
                "amount_requested": created.amount_requested,
                "duration_in_months": created.duration_in_months,
            }),
            Some(actor.user_id.as_str()),
        )
        .await;
        Ok(created)
    }

    pub async fn get_application(&self, application_id: &str) -> Result<Option<LoanApplication>, LendingError> {
        self.storage.get_application(application_id).await
    }

    pub async fn list_applications(
        &self,
        criteria: &ApplicationCriteria,
    ) -> Result<Vec<LoanApplication>, LendingError> {
        self.storage.find_applications(criteria).await
    }

    /// Evaluates the eligibility policy against the borrower's full history.
    pub async fn check_eligibility(&self, borrower_id: &str) -> Result<BorrowerHistory, LendingError> {
        let applications = self
            .storage
            .find_applications(&ApplicationCriteria {
                borrower_id: Some(borrower_id.to_string()),
                status: None,
            })
            .await?;
        let loans = self
            .storage
            .find_loans(&LoanCriteria {
                borrower_id: Some(borrower_id.to_string()),
                ..LoanCriteria::default()
            })
            .await?;
        let history = BorrowerHistory::from_records(&applications, &loans);
        debug!("Borrower {} history: {:?}", borrower_id, history);
        self.policy.evaluate(&history)?;
        Ok(history)
    }

    /// Staff decision turning a pending application into an approved loan.
    pub async fn approve_application(
        &self,
        actor: &Actor,
        application_id: &str,
        lender_id: Option<&str>,
        interest_rate: Option<f64>,
    ) -> Result<Loan, LendingError> {
        info!("User {} approving application {}", actor.user_id, application_id);
        actor.require_staff("approve loans")?;

        let mut application = self.require_application(application_id).await?;
        if application.status != LoanStatus::Pending {
            warn!(
                "Application {} already processed (status {})",
                application.id, application.status
            );
            return Err(LendingError::InvalidState {
                entity: "loan application",
                id: application.id,
                status: application.status,
                action: "approve",
            });
        }

        if let Err(e) = self.check_eligibility(&application.borrower_id).await {
            warn!("Borrower {} refused: {}", application.borrower_id, e);
            return Err(e);
        }

        if let Some(lender_id) = lender_id {
            let lender = self.require_user(lender_id).await?;
            if !lender.has_role(Role::Lender) {
                return Err(LendingError::NotAuthorized(format!(
                    "user {} is not a lender",
                    lender_id
                )));
            }
        }

        let rate = interest_rate.unwrap_or(self.default_interest_rate);
        let loan = lifecycle::approve(&mut application, lender_id.map(String::from), rate, Utc::now())?;
        let (application, loan) = self.storage.commit_approval(application, loan).await?;
        debug!("Application {} approved as loan {}", application.id, loan.id);

        self.log_and_audit(
            AuditAction::ApplicationApproved,
            &loan.id,
            json!({
                "application_id": application.id,
                "loan_id": loan.id,
                "borrower_id": loan.borrower_id,
                "lender_id": loan.lender_id,
                "interest_rate": loan.interest_rate,
            }),
            Some(actor.user_id.as_str()),
        )
        .await;
        Ok(loan)
    }

    pub async fn reject_application(
        &self,
        actor: &Actor,
        application_id: &str,
    ) -> Result<LoanApplication, LendingError> {
        info!("User {} rejecting application {}", actor.user_id, application_id);
        actor.require_staff("reject loans")?;

        let mut application = self.require_application(application_id).await?;
        lifecycle::reject(&mut application, Utc::now())?;
        let saved = self.storage.update_application(application).await?;

        self.log_and_audit(
            AuditAction::ApplicationRejected,
            &saved.id,
            json!({ "application_id": saved.id, "borrower_id": saved.borrower_id }),
            Some(actor.user_id.as_str()),
        )
        .await;
        Ok(saved)
    }

    // LOANS

    pub async fn get_loan(&self, loan_id: &str) -> Result<Option<Loan>, LendingError> {
        self.storage.get_loan(loan_id).await
    }

    pub async fn list_loans(&self, criteria: &LoanCriteria) -> Result<Vec<Loan>, LendingError> {
        self.storage.find_loans(criteria).await
    }

    /// A lender funds an approved loan that was approved without one.
    pub async fn assign_lender(&self, actor: &Actor, loan_id: &str) -> Result<Loan, LendingError> {
        info!("Lender {} funding loan {}", actor.user_id, loan_id);
        actor.require_role(Role::Lender, "fund loans")?;

        let mut loan = self.require_loan(loan_id).await?;
        if loan.borrower_id == actor.user_id {
            return Err(LendingError::NotAuthorized(format!(
                "user {} cannot fund their own loan",
                actor.user_id
            )));
        }
        lifecycle::assign_lender(&mut loan, &actor.user_id, Utc::now())?;
        let saved = self.storage.update_loan(loan).await?;

        self.log_and_audit(
            AuditAction::LenderAssigned,
            &saved.id,
            json!({ "loan_id": saved.id, "lender_id": actor.user_id }),
            Some(actor.user_id.as_str()),
        )
        .await;
        Ok(saved)
    }

    pub async fn get_transaction(&self, loan_id: &str) -> Result<Option<Transaction>, LendingError> {
        self.storage.get_transaction_by_loan(loan_id).await
    }

    /// Adds a repayment to the loan's transaction, completing the loan once the
    /// owed amount is covered.
    pub async fn record_payment(
        &self,
        actor: &Actor,
        loan_id: &str,
        amount: Decimal,
    ) -> Result<Transaction, LendingError> {
        info!("User {} paying {} on loan {}", actor.user_id, amount, loan_id);
        self.validate_amount_input("amount", amount)?;

        let mut loan = self.require_loan(loan_id).await?;
        if loan.borrower_id != actor.user_id && !actor.is_staff {
            warn!("User {} attempted to repay loan {} of another borrower", actor.user_id, loan.id);
            return Err(LendingError::NotAuthorized(format!(
                "user {} cannot record payments on loan {}",
                actor.user_id, loan.id
            )));
        }

        let now = Utc::now();
        let mut transaction = match self.storage.get_transaction_by_loan(&loan.id).await? {
            Some(tx) => tx,
            None => lifecycle::open_transaction(&loan, now)?,
        };
        let outcome = lifecycle::record_payment(&mut transaction, &mut loan, amount, now)?;
        let (transaction, loan) = self.storage.commit_payment(transaction, loan).await?;

        self.log_and_audit(
            AuditAction::PaymentRecorded,
            &loan.id,
            json!({
                "loan_id": loan.id,
                "transaction_id": transaction.id,
                "amount": amount,
                "total_paid": transaction.amount,
            }),
            Some(actor.user_id.as_str()),
        )
        .await;
        if outcome == PaymentOutcome::Completed {
            info!("Loan {} completed", loan.id);
            self.log_and_audit(
                AuditAction::LoanCompleted,
                &loan.id,
                json!({ "loan_id": loan.id, "borrower_id": loan.borrower_id }),
                Some(actor.user_id.as_str()),
            )
            .await;
        }
        Ok(transaction)
    }

    pub async fn loan_statement(&self, loan_id: &str) -> Result<LoanStatement, LendingError> {
        let loan = self.require_loan(loan_id).await?;
        let paid = self
            .storage
            .get_transaction_by_loan(loan_id)
            .await?
            .map(|tx| tx.amount)
            .unwrap_or(Decimal::ZERO);
        ledger::statement(&loan, paid)
    }

    // REVIEWS

    /// Stores the review and recomputes the reviewed user's rating from all
    /// of their reviews in the same storage commit.
    pub async fn submit_review(
        &self,
        actor: &Actor,
        reviewed_user_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Review, LendingError> {
        info!("User {} reviewing user {} ({})", actor.user_id, reviewed_user_id, rating);
        reputation::validate_rating(rating)?;
        self.validate_optional_text("comment", &comment)?;
        self.require_user(&actor.user_id).await?;

        let review = Review {
            id: Uuid::new_v4().to_string(),
            reviewer_id: actor.user_id.clone(),
            reviewed_user_id: reviewed_user_id.to_string(),
            rating,
            comment,
            created_at: Utc::now(),
        };
        let (saved, reviewed) = self.storage.create_review_and_rate(review).await?;
        let new_rating = reviewed.rating;
        debug!("User {} rating now {:.2}", reviewed.id, new_rating);

        self.log_and_audit(
            AuditAction::ReviewSubmitted,
            reviewed_user_id,
            json!({
                "review_id": saved.id,
                "reviewed_user_id": reviewed_user_id,
                "rating": rating,
                "new_rating": new_rating,
            }),
            Some(actor.user_id.as_str()),
        )
        .await;
        Ok(saved)
    }

    pub async fn get_reviews(&self, user_id: &str) -> Result<Vec<Review>, LendingError> {
        self.storage.get_reviews_for_user(user_id).await
    }

    pub async fn get_logs(&self) -> Result<Vec<AppLog>, LendingError> {
        self.logging.get_logs().await
    }

    /// Money-moving audit entries for one loan, oldest first.
    pub async fn loan_history(&self, loan_id: &str) -> Result<Vec<AppLog>, LendingError> {
        let loan = self.require_loan(loan_id).await?;
        let mut entries = self.logging.get_subject_logs(&loan.id).await?;
        entries.retain(|entry| entry.action.is_ledger_event());
        Ok(entries)
    }
}
