use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Marketplace role a user was registered under.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Lender,
    Borrower,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Lender => "LENDER",
            Role::Borrower => "BORROWER",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LENDER" => Ok(Role::Lender),
            "BORROWER" => Ok(Role::Borrower),
            other => Err(format!("unknown role {}", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    /// Mean of received review ratings, 0.0 when unreviewed.
    pub rating: f64,
    pub number_of_loans: u32,
    pub number_of_loans_repaid: u32,
    pub roles: BTreeSet<Role>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
