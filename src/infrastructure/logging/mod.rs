pub mod in_memory;

use crate::config::Config;
use crate::core::errors::LedgerError;
use crate::core::models::{AppLog, MemberId};
use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

#[async_trait]
pub trait LoggingService: Send + Sync {
    /// Records `action`. `details` must be a JSON object.
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        member: Option<&MemberId>,
    ) -> Result<(), LedgerError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError>;
    /// Entries performed by `member`, newest first.
    async fn get_member_logs(&self, member: &MemberId) -> Result<Vec<AppLog>, LedgerError>;
}

/// Installs the global fmt subscriber. `RUST_LOG` wins over the configured
/// level when set. Records emitted through the `log` facade are forwarded.
pub fn init_tracing(config: &Config) -> Result<(), LedgerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| LedgerError::LoggingError(format!("Invalid log level: {}", e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| LedgerError::LoggingError(format!("Failed to install subscriber: {}", e)))
}
