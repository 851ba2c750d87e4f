use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub reviewer_id: String,
    pub reviewed_user_id: String,
    /// 1 to 5 stars
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
