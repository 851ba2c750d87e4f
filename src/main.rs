use peerlend::auth::jwt::JwtService;
use peerlend::config::CONFIG;
use peerlend::core::models::Role;
use peerlend::{InMemoryLogging, InMemoryStorage, LendingError, LendingService, NewApplication, NewUser};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn new_user(username: &str, roles: &[Role], is_staff: bool) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@peerlend.local", username),
        phone_number: None,
        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        is_staff,
    }
}

/// Walks one application through the lifecycle against in-memory collaborators.
#[tokio::main]
async fn main() -> Result<(), LendingError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Starting peerlend demo with {:?}", *CONFIG);

    let service = LendingService::with_policy(
        InMemoryStorage::new(),
        InMemoryLogging::new(),
        CONFIG.policy,
        CONFIG.default_interest_rate,
    );
    let jwt = JwtService::new(CONFIG.jwt_secret.clone());

    let staff_user = service.register_user(new_user("staff", &[], true)).await?;
    let lender_user = service.register_user(new_user("lender", &[Role::Lender], false)).await?;
    let borrower_user = service.register_user(new_user("borrower", &[Role::Borrower], false)).await?;

    // The staff actor arrives as a bearer token, the others are loaded directly.
    let token = jwt.generate_token(&service.resolve_actor(&staff_user.id).await?)?;
    let staff = jwt.resolve_actor(&token)?;
    let lender = service.resolve_actor(&lender_user.id).await?;
    let borrower = service.resolve_actor(&borrower_user.id).await?;

    let application = service
        .submit_application(
            &borrower,
            NewApplication {
                amount_requested: Decimal::new(1000, 0),
                purpose: "Market stall equipment".to_string(),
                duration_in_months: 6,
                collateral: None,
            },
        )
        .await?;
    info!("Application {} submitted", application.id);

    let loan = match service
        .approve_application(&staff, &application.id, Some(&lender.user_id), None)
        .await
    {
        Ok(loan) => loan,
        Err(LendingError::NotEligible(reason)) => {
            warn!("Approval refused: {} (tune MIN_REPAID_LOANS / MAX_APPROVED_APPLICATIONS)", reason);
            let rejected = service.reject_application(&staff, &application.id).await?;
            info!("Application {} is now {}", rejected.id, rejected.status);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    info!("Loan {} approved at {}%", loan.id, loan.interest_rate);

    let statement = service.loan_statement(&loan.id).await?;
    let installment = (statement.owed / Decimal::from(loan.duration_in_months)).round_dp(2);
    while !service.loan_statement(&loan.id).await?.completed {
        let remaining = service.loan_statement(&loan.id).await?.remaining;
        let tx = service
            .record_payment(&borrower, &loan.id, installment.min(remaining))
            .await?;
        info!("Paid {} of {} on loan {}", tx.amount, statement.owed, loan.id);
    }

    service
        .submit_review(&lender, &borrower.user_id, 5, Some("Repaid on schedule".to_string()))
        .await?;
    if let Some(user) = service.get_user(&borrower.user_id).await? {
        info!(
            "Borrower {} rating {:.1}, loans {}, repaid {}",
            user.username, user.rating, user.number_of_loans, user.number_of_loans_repaid
        );
    }
    for entry in service.loan_history(&loan.id).await? {
        info!("Loan {} {} at {}", loan.id, entry.action, entry.timestamp);
    }
    info!("{} audit entries recorded", service.get_logs().await?.len());
    Ok(())
}
