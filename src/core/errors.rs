use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LedgerError {
    /// Amount is zero, negative, malformed or too small to split
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Payer missing from the member set, or the member set is empty
    #[error("Invalid group state: {0}")]
    InvalidGroupState(String),

    /// A split points at an expense that is not in the ledger
    #[error("Split {split_id} references missing expense {expense_id}")]
    DanglingSplitReference { split_id: String, expense_id: String },

    #[error("Unsupported currency: {0}")]
    InvalidCurrency(String),

    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    #[error("Split {0} not found")]
    SplitNotFound(String),

    #[error("Member {0} is already a group member")]
    AlreadyGroupMember(String),

    #[error("Member {0} is not a group member")]
    NotGroupMember(String),

    /// Only the member who created a group or expense may change or delete it
    #[error("Member {0} did not create this record")]
    NotCreator(String),

    /// Only the obligor or the payer may settle a split
    #[error("Member {0} is not a party to split {1}")]
    NotSplitParty(String, String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
