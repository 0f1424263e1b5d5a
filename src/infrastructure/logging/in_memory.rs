use crate::core::errors::LedgerError;
use crate::core::models::{AppLog, MemberId};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only action log held in process memory.
#[derive(Clone, Default)]
pub struct InMemoryLogging {
    entries: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(&self, action: &str, details: Value, member: Option<&MemberId>) -> Result<(), LedgerError> {
        let Value::Object(fields) = details else {
            return Err(LedgerError::LoggingError(format!(
                "details for {action} must be a JSON object"
            )));
        };
        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            member_id: member.cloned(),
            details: fields.into_iter().collect(),
            timestamp: Utc::now(),
        };
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        Ok(self.entries.read().await.clone())
    }

    async fn get_member_logs(&self, member: &MemberId) -> Result<Vec<AppLog>, LedgerError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| entry.member_id.as_ref() == Some(member))
            .cloned()
            .collect())
    }
}
