pub mod jwt;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::errors::LendingError;
use crate::core::models::{Role, User};

/// The caller of a lending operation, resolved once per request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub is_staff: bool,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        Actor {
            user_id: user.id.clone(),
            is_staff: user.is_staff,
            roles: user.roles.clone(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn require_staff(&self, action: &str) -> Result<(), LendingError> {
        if !self.is_staff {
            return Err(LendingError::NotAuthorized(format!(
                "user {} is not staff and cannot {}",
                self.user_id, action
            )));
        }
        Ok(())
    }

    pub fn require_role(&self, role: Role, action: &str) -> Result<(), LendingError> {
        if !self.has_role(role) {
            return Err(LendingError::NotAuthorized(format!(
                "user {} lacks the {} role required to {}",
                self.user_id, role, action
            )));
        }
        Ok(())
    }
}
