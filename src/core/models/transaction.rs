use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Repayment record of a loan. There is at most one per loan; `amount` is the
/// running total of `payments`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub loan_id: String,
    pub lender_id: String,
    pub borrower_id: String,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub is_repaid: bool,
    pub payments: Vec<Payment>,
    pub version: u64,
}
