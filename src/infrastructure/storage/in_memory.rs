use crate::core::errors::LedgerError;
use crate::core::models::{Expense, Group, GroupAudit, MemberId, SettlementOutcome, Split};
use crate::infrastructure::storage::{LedgerSnapshot, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Expenses and splits share one lock so that an expense and its splits are
/// always committed, deleted and read together.
#[derive(Default)]
struct LedgerTables {
    expenses: HashMap<String, Expense>,
    splits: HashMap<String, Split>,
}

impl LedgerTables {
    fn remove_expense(&mut self, expense_id: &str) -> Option<Expense> {
        let removed = self.expenses.remove(expense_id);
        self.splits.retain(|_, s| s.expense_id != expense_id);
        removed
    }

    /// Copies out the listed expenses and every split pointing at one of the
    /// ids, including splits whose expense is no longer present.
    fn select(&self, expense_ids: &HashSet<&str>) -> LedgerSnapshot {
        LedgerSnapshot {
            expenses: expense_ids
                .iter()
                .filter_map(|id| self.expenses.get(*id))
                .cloned()
                .collect(),
            splits: self
                .splits
                .values()
                .filter(|s| expense_ids.contains(s.expense_id.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// Lock order is `groups` before `ledger`.
#[derive(Clone)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    ledger: Arc<RwLock<LedgerTables>>,
    group_audits: Arc<RwLock<HashMap<String, Vec<GroupAudit>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            groups: Arc::new(RwLock::new(HashMap::new())),
            ledger: Arc::new(RwLock::new(LedgerTables::default())),
            group_audits: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        let mut ledger = self.ledger.write().await;
        groups.remove(group_id);
        let expense_ids: Vec<String> = ledger
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| e.id.clone())
            .collect();
        for expense_id in expense_ids {
            ledger.remove_expense(&expense_id);
        }
        Ok(())
    }

    async fn get_member_groups(&self, member: &MemberId) -> Result<Vec<Group>, LedgerError> {
        let groups = self.groups.read().await;
        Ok(groups
            .values()
            .filter(|g| g.is_member(member))
            .cloned()
            .collect())
    }

    async fn save_expense_with_splits(&self, expense: Expense, splits: Vec<Split>) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.write().await;
        if ledger.expenses.contains_key(&expense.id) {
            return Err(LedgerError::StorageError(format!(
                "expense {} already exists",
                expense.id
            )));
        }
        if let Some(split) = splits.iter().find(|s| s.expense_id != expense.id) {
            return Err(LedgerError::StorageError(format!(
                "split {} does not belong to expense {}",
                split.id, expense.id
            )));
        }
        for split in splits {
            ledger.splits.insert(split.id.clone(), split);
        }
        ledger.expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn update_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.write().await;
        match ledger.expenses.get_mut(&expense.id) {
            Some(existing) => {
                *existing = expense;
                Ok(())
            }
            None => Err(LedgerError::ExpenseNotFound(expense.id)),
        }
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.expenses.get(expense_id).cloned())
    }

    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.write().await;
        ledger
            .remove_expense(expense_id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))
    }

    async fn get_split(&self, split_id: &str) -> Result<Option<Split>, LedgerError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.splits.get(split_id).cloned())
    }

    async fn get_expense_splits(&self, expense_id: &str) -> Result<Vec<Split>, LedgerError> {
        let ledger = self.ledger.read().await;
        let mut splits: Vec<Split> = ledger
            .splits
            .values()
            .filter(|s| s.expense_id == expense_id)
            .cloned()
            .collect();
        splits.sort_by(|a, b| a.obligor.cmp(&b.obligor));
        Ok(splits)
    }

    async fn settle_split(
        &self,
        split_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(Split, SettlementOutcome), LedgerError> {
        let mut ledger = self.ledger.write().await;
        let split = ledger
            .splits
            .get_mut(split_id)
            .ok_or_else(|| LedgerError::SplitNotFound(split_id.to_string()))?;
        let outcome = split.mark_settled(at);
        Ok((split.clone(), outcome))
    }

    async fn member_ledger_snapshot(&self, member: &MemberId) -> Result<LedgerSnapshot, LedgerError> {
        let ledger = self.ledger.read().await;
        let mut expense_ids: HashSet<&str> = ledger
            .expenses
            .values()
            .filter(|e| e.payer == *member)
            .map(|e| e.id.as_str())
            .collect();
        expense_ids.extend(
            ledger
                .splits
                .values()
                .filter(|s| s.obligor == *member)
                .map(|s| s.expense_id.as_str()),
        );
        Ok(ledger.select(&expense_ids))
    }

    async fn group_ledger_snapshot(&self, group_id: &str) -> Result<LedgerSnapshot, LedgerError> {
        let ledger = self.ledger.read().await;
        let expense_ids: HashSet<&str> = ledger
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| e.id.as_str())
            .collect();
        Ok(ledger.select(&expense_ids))
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), LedgerError> {
        let mut group_audits = self.group_audits.write().await;
        group_audits
            .entry(audit.group_id.clone())
            .or_insert_with(Vec::new)
            .push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        let group_audits = self.group_audits.read().await;
        Ok(group_audits.get(group_id).cloned().unwrap_or_default())
    }
}
