use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::LoanStatus;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Loan {
    pub id: String,
    pub application_id: String,
    pub borrower_id: String,
    pub lender_id: Option<String>,
    pub amount_requested: Decimal,
    /// Flat percentage over the whole term, e.g. `5.0` for 5%.
    pub interest_rate: f64,
    pub duration_in_months: u32,
    pub collateral: Option<String>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}
