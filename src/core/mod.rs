pub mod eligibility;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod reputation;
pub mod services;
