use crate::core::errors::{IneligibilityReason, LendingError};
use crate::core::models::{LoanStatus, Role};
use crate::infrastructure::storage::{ApplicationCriteria, LoanCriteria};
use crate::tests::{
    application_request, create_lenient_service, create_test_service, register, seed_repaid_loan,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_submit_application_validates_input() {
    let (service, _) = create_lenient_service();
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;

    let app = service
        .submit_application(&borrower, application_request(dec!(1000)))
        .await
        .unwrap();
    assert_eq!(app.status, LoanStatus::Pending);
    assert_eq!(app.borrower_id, borrower.user_id);

    let zero = service
        .submit_application(&borrower, application_request(dec!(0)))
        .await;
    assert!(matches!(zero, Err(LendingError::InvalidInput(field, _)) if field == "amount_requested"));

    let fractional = service
        .submit_application(&borrower, application_request(dec!(10.005)))
        .await;
    assert!(matches!(fractional, Err(LendingError::InvalidInput(..))));

    let mut no_term = application_request(dec!(500));
    no_term.duration_in_months = 0;
    let result = service.submit_application(&borrower, no_term).await;
    assert!(matches!(result, Err(LendingError::InvalidInput(field, _)) if field == "duration_in_months"));
}

#[tokio::test]
async fn test_only_borrowers_apply() {
    let (service, _) = create_lenient_service();
    let (_, lender) = register(&service, "lou", &[Role::Lender], false).await;
    let result = service
        .submit_application(&lender, application_request(dec!(1000)))
        .await;
    assert!(matches!(result, Err(LendingError::NotAuthorized(_))));
}

#[tokio::test]
async fn test_approve_creates_single_loan() {
    let (service, _) = create_lenient_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, lender) = register(&service, "lou", &[Role::Lender], false).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    let app = service
        .submit_application(&borrower, application_request(dec!(1000)))
        .await
        .unwrap();

    let loan = service
        .approve_application(&staff, &app.id, Some(&lender.user_id), None)
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Approved);
    assert_eq!(loan.application_id, app.id);
    assert_eq!(loan.amount_requested, dec!(1000));
    assert_eq!(loan.interest_rate, 5.0);
    assert_eq!(loan.collateral.as_deref(), Some("Oven"));
    assert_eq!(loan.lender_id.as_deref(), Some(lender.user_id.as_str()));

    let stored = service.get_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoanStatus::Approved);
    let loans = service.list_loans(&LoanCriteria::default()).await.unwrap();
    assert_eq!(loans.len(), 1);

    let borrower_user = service.get_user(&borrower.user_id).await.unwrap().unwrap();
    assert_eq!(borrower_user.number_of_loans, 1);

    let again = service
        .approve_application(&staff, &app.id, None, None)
        .await;
    assert!(matches!(
        again,
        Err(LendingError::InvalidState { status: LoanStatus::Approved, .. })
    ));
    assert_eq!(service.list_loans(&LoanCriteria::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_oversized_interest_rate_persists_nothing() {
    let (service, _) = create_lenient_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, lender) = register(&service, "lou", &[Role::Lender], false).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    let app = service
        .submit_application(&borrower, application_request(dec!(99999999.99)))
        .await
        .unwrap();

    let result = service
        .approve_application(&staff, &app.id, Some(&lender.user_id), Some(1e22))
        .await;
    assert!(matches!(result, Err(LendingError::InvalidInput(field, _)) if field == "interest_rate"));

    let stored = service.get_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoanStatus::Pending);
    assert!(service.list_loans(&LoanCriteria::default()).await.unwrap().is_empty());
    let borrower_user = service.get_user(&borrower.user_id).await.unwrap().unwrap();
    assert_eq!(borrower_user.number_of_loans, 0);

    // the largest principal at the highest allowed rate still approves
    let loan = service
        .approve_application(&staff, &app.id, Some(&lender.user_id), Some(100.0))
        .await
        .unwrap();
    assert_eq!(service.loan_statement(&loan.id).await.unwrap().owed, dec!(199999999.98));
}

#[tokio::test]
async fn test_approval_requires_staff() {
    let (service, _) = create_lenient_service();
    let (_, lender) = register(&service, "lou", &[Role::Lender], false).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    let app = service
        .submit_application(&borrower, application_request(dec!(1000)))
        .await
        .unwrap();

    let result = service.approve_application(&lender, &app.id, None, None).await;
    assert!(matches!(result, Err(LendingError::NotAuthorized(_))));
    let result = service.reject_application(&borrower, &app.id).await;
    assert!(matches!(result, Err(LendingError::NotAuthorized(_))));
}

#[tokio::test]
async fn test_approve_with_non_lender_is_refused() {
    let (service, _) = create_lenient_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    let (_, other) = register(&service, "oli", &[Role::Borrower], false).await;
    let app = service
        .submit_application(&borrower, application_request(dec!(1000)))
        .await
        .unwrap();

    let result = service
        .approve_application(&staff, &app.id, Some(&other.user_id), None)
        .await;
    assert!(matches!(result, Err(LendingError::NotAuthorized(_))));
    let stored = service.get_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoanStatus::Pending);
}

#[tokio::test]
async fn test_reject_is_terminal() {
    let (service, _) = create_lenient_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    let app = service
        .submit_application(&borrower, application_request(dec!(250)))
        .await
        .unwrap();

    let rejected = service.reject_application(&staff, &app.id).await.unwrap();
    assert_eq!(rejected.status, LoanStatus::Rejected);

    let twice = service.reject_application(&staff, &app.id).await;
    assert!(matches!(twice, Err(LendingError::InvalidState { .. })));
    let approve = service.approve_application(&staff, &app.id, None, None).await;
    assert!(matches!(
        approve,
        Err(LendingError::InvalidState { status: LoanStatus::Rejected, .. })
    ));
    assert!(service.list_loans(&LoanCriteria::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_application() {
    let (service, _) = create_lenient_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let result = service.approve_application(&staff, "missing", None, None).await;
    assert_eq!(result, Err(LendingError::ApplicationNotFound("missing".to_string())));
}

#[tokio::test]
async fn test_new_borrower_lacks_repayment_history() {
    let (service, storage) = create_test_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    for _ in 0..2 {
        seed_repaid_loan(&storage, &borrower.user_id).await;
    }

    let app = service
        .submit_application(&borrower, application_request(dec!(1000)))
        .await
        .unwrap();
    let result = service.approve_application(&staff, &app.id, None, None).await;
    assert_eq!(
        result,
        Err(LendingError::NotEligible(
            IneligibilityReason::InsufficientRepaymentHistory { repaid: 2, min: 3 }
        ))
    );
    let stored = service.get_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoanStatus::Pending);
}

#[tokio::test]
async fn test_repaid_history_unlocks_approval() {
    let (service, storage) = create_test_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;
    for _ in 0..3 {
        seed_repaid_loan(&storage, &borrower.user_id).await;
    }
    let seeded = service.get_user(&borrower.user_id).await.unwrap().unwrap();
    assert_eq!(seeded.number_of_loans_repaid, 3);

    let app = service
        .submit_application(&borrower, application_request(dec!(1000)))
        .await
        .unwrap();
    let loan = service
        .approve_application(&staff, &app.id, None, Some(7.5))
        .await
        .unwrap();
    assert_eq!(loan.interest_rate, 7.5);
    assert_eq!(loan.lender_id, None);
}

#[tokio::test]
async fn test_too_many_approved_applications() {
    let (service, _) = create_lenient_service();
    let (_, staff) = register(&service, "sam", &[], true).await;
    let (_, borrower) = register(&service, "bea", &[Role::Borrower], false).await;

    for _ in 0..6 {
        let app = service
            .submit_application(&borrower, application_request(dec!(100)))
            .await
            .unwrap();
        service.approve_application(&staff, &app.id, None, None).await.unwrap();
    }

    let app = service
        .submit_application(&borrower, application_request(dec!(100)))
        .await
        .unwrap();
    let result = service.approve_application(&staff, &app.id, None, None).await;
    assert_eq!(
        result,
        Err(LendingError::NotEligible(
            IneligibilityReason::TooManyOutstandingLoans { approved: 6, max: 5 }
        ))
    );

    let pending = service
        .list_applications(&ApplicationCriteria {
            borrower_id: Some(borrower.user_id.clone()),
            status: Some(LoanStatus::Pending),
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}
