use super::member::MemberId;
use crate::core::money::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: MemberId,
    pub currency: Currency,
    /// A member appears at most once; the set keeps them in identifier order.
    pub members: BTreeSet<MemberId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    pub fn is_creator(&self, member: &MemberId) -> bool {
        self.created_by == *member
    }
}
