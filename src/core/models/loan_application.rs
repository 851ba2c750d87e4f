use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::LoanStatus;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoanApplication {
    pub id: String,
    pub borrower_id: String,
    pub amount_requested: Decimal,
    pub purpose: String,
    pub duration_in_months: u32,
    pub collateral: Option<String>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by storage on every write.
    pub version: u64,
}
