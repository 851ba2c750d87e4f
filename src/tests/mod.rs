mod application_tests;

use crate::auth::Actor;
use crate::core::eligibility::EligibilityPolicy;
use crate::core::lifecycle;
use crate::core::models::{LoanApplication, LoanStatus, Role, User};
use crate::core::services::{LendingService, NewApplication, NewUser};
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

pub type TestService = LendingService<InMemoryLogging, InMemoryStorage>;

/// Service with the default eligibility policy plus a handle on its storage.
pub fn create_test_service() -> (TestService, InMemoryStorage) {
    let _ = env_logger::try_init();
    let storage = InMemoryStorage::new();
    let service = LendingService::new(storage.clone(), InMemoryLogging::new());
    (service, storage)
}

/// Service that approves first-time borrowers.
pub fn create_lenient_service() -> (TestService, InMemoryStorage) {
    let _ = env_logger::try_init();
    let storage = InMemoryStorage::new();
    let policy = EligibilityPolicy {
        min_repaid_loans: 0,
        ..EligibilityPolicy::default()
    };
    let service = LendingService::with_policy(storage.clone(), InMemoryLogging::new(), policy, 5.0);
    (service, storage)
}

pub async fn register(service: &TestService, name: &str, roles: &[Role], is_staff: bool) -> (User, Actor) {
    let user = service
        .register_user(NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            phone_number: None,
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            is_staff,
        })
        .await
        .unwrap();
    let actor = service.resolve_actor(&user.id).await.unwrap();
    (user, actor)
}

pub fn application_request(amount: Decimal) -> NewApplication {
    NewApplication {
        amount_requested: amount,
        purpose: "Expand the bakery".to_string(),
        duration_in_months: 12,
        collateral: Some("Oven".to_string()),
    }
}

/// Writes a fully repaid loan for `borrower_id` straight into storage.
pub async fn seed_repaid_loan(storage: &InMemoryStorage, borrower_id: &str) {
    let now = Utc::now();
    let application = storage
        .create_application(LoanApplication {
            id: uuid::Uuid::new_v4().to_string(),
            borrower_id: borrower_id.to_string(),
            amount_requested: dec!(100),
            purpose: "History".to_string(),
            duration_in_months: 1,
            collateral: None,
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
            version: 0,
        })
        .await
        .unwrap();
    let mut approved = application;
    let loan = lifecycle::approve(&mut approved, Some("seed-lender".to_string()), 0.0, now).unwrap();
    let (_, mut loan) = storage.commit_approval(approved, loan).await.unwrap();
    let mut tx = lifecycle::open_transaction(&loan, now).unwrap();
    lifecycle::record_payment(&mut tx, &mut loan, dec!(100), now).unwrap();
    storage.commit_payment(tx, loan).await.unwrap();
}
