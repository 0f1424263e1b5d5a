use crate::core::errors::LedgerError;
use crate::core::models::{
    Expense, Group, GroupAudit, MemberId, SettlementOutcome, Split,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Expenses and splits read together at one point in time.
#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    pub expenses: Vec<Expense>,
    pub splits: Vec<Split>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    /// Removes the group together with its expenses and their splits.
    async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError>;
    async fn get_member_groups(&self, member: &MemberId) -> Result<Vec<Group>, LedgerError>;

    /// Persists an expense and all of its splits as one unit.
    async fn save_expense_with_splits(&self, expense: Expense, splits: Vec<Split>) -> Result<(), LedgerError>;
    async fn update_expense(&self, expense: Expense) -> Result<(), LedgerError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError>;
    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError>;
    /// Removes the expense and its splits.
    async fn delete_expense(&self, expense_id: &str) -> Result<(), LedgerError>;

    async fn get_split(&self, split_id: &str) -> Result<Option<Split>, LedgerError>;
    async fn get_expense_splits(&self, expense_id: &str) -> Result<Vec<Split>, LedgerError>;
    /// Settles a split in place. Settling an already settled split succeeds
    /// and leaves it untouched.
    async fn settle_split(
        &self,
        split_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(Split, SettlementOutcome), LedgerError>;

    /// Every expense the member paid for, every split the member owes, and
    /// the expenses and sibling splits those records join to, across all
    /// groups. Taken under a single read.
    async fn member_ledger_snapshot(&self, member: &MemberId) -> Result<LedgerSnapshot, LedgerError>;
    /// Expenses of one group and all of their splits, under a single read.
    async fn group_ledger_snapshot(&self, group_id: &str) -> Result<LedgerSnapshot, LedgerError>;

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), LedgerError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError>;
}

pub mod in_memory;
