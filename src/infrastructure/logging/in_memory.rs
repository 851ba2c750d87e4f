use crate::core::errors::LendingError;
use crate::core::models::{AppLog, AuditAction};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: AuditAction,
        subject_id: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LendingError> {
        let details = serde_json::from_value(details)
            .map_err(|e| LendingError::LoggingError(format!("{} details must be an object: {}", action, e)))?;
        self.logs.write().await.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action,
            user_id: user_id.map(String::from),
            subject_id: subject_id.to_string(),
            details,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, LendingError> {
        Ok(self.logs.read().await.clone())
    }

    async fn get_subject_logs(&self, subject_id: &str) -> Result<Vec<AppLog>, LendingError> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .filter(|l| l.subject_id == subject_id)
            .cloned()
            .collect())
    }
}
