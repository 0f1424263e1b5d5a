use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settlement state of a split. `Settled` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SettlementState {
    #[default]
    Unsettled,
    Settled {
        #[serde(with = "chrono::serde::ts_seconds")]
        at: DateTime<Utc>,
    },
}

impl SettlementState {
    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementState::Settled { .. })
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SettlementState::Settled { at } => Some(*at),
            SettlementState::Unsettled => None,
        }
    }
}

/// What a `mark_settled` call did. Both outcomes are successes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Settled,
    AlreadySettled,
}
