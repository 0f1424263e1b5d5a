use super::member::MemberId;
use super::settlement::{SettlementOutcome, SettlementState};
use crate::core::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One obligor's share of a group expense, owed to the expense's payer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub id: String,
    pub expense_id: String,
    pub obligor: MemberId,
    pub amount: Money,
    pub state: SettlementState,
    pub created_at: DateTime<Utc>,
}

impl Split {
    pub fn is_settled(&self) -> bool {
        self.state.is_settled()
    }

    /// Moves the split to `Settled`. On an already settled split this is a
    /// no-op and the original settlement time is kept.
    pub fn mark_settled(&mut self, at: DateTime<Utc>) -> SettlementOutcome {
        match self.state {
            SettlementState::Settled { .. } => SettlementOutcome::AlreadySettled,
            SettlementState::Unsettled => {
                self.state = SettlementState::Settled { at };
                SettlementOutcome::Settled
            }
        }
    }
}

/// A member's computed share before it is turned into a persisted [`Split`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberShare {
    pub member: MemberId,
    pub amount: Money,
}
