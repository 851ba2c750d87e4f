pub mod audit;
pub mod loan;
pub mod loan_application;
pub mod review;
pub mod status;
pub mod transaction;
pub mod user;

pub use audit::{AppLog, AuditAction};
pub use loan::Loan;
pub use loan_application::LoanApplication;
pub use review::Review;
pub use status::LoanStatus;
pub use transaction::{Payment, Transaction};
pub use user::{Role, User};
