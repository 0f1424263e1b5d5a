use super::member::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Application-wide action log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppLog {
    pub id: String,
    pub action: String,
    pub member_id: Option<MemberId>,
    pub details: HashMap<String, serde_json::Value>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Audit entry scoped to one group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupAudit {
    pub id: String,
    pub group_id: String,
    pub action: String,
    pub member_id: Option<MemberId>,
    pub details: HashMap<String, serde_json::Value>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}
