pub mod in_memory;

use crate::core::errors::LendingError;
use crate::core::models::{AppLog, AuditAction};
use async_trait::async_trait;

/// Audit trail of lending events. `details` must be a JSON object.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: AuditAction,
        subject_id: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LendingError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, LendingError>;
    /// Entries about one loan, application, review or user, oldest first.
    async fn get_subject_logs(&self, subject_id: &str) -> Result<Vec<AppLog>, LendingError>;
}
