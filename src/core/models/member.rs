use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a ledger participant.
///
/// Ordering is significant: leftover minor units of an uneven split go to
/// members in ascending identifier order, and balance breakdowns are reported
/// in the same order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        MemberId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        MemberId(value.to_string())
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        MemberId(value)
    }
}
