use crate::config::{CONFIG, Config};
use crate::constants::{
    BALANCE_QUERIED, EXPENSE_ADDED, EXPENSE_DELETED, EXPENSE_UPDATED, GROUP_CREATED, GROUP_DELETED,
    MAX_NAME_LENGTH, MAX_NOTES_LENGTH, MEMBER_ADDED, MEMBER_REMOVED, SPLIT_SETTLED,
};
use crate::core::balance_aggregator::BalanceAggregator;
use crate::core::errors::{FieldError, LedgerError};
use crate::core::models::{
    AppLog, BalanceReport, Expense, ExpenseDetailsUpdate, Group, GroupAudit, MemberId, NewExpense,
    SettlementOutcome, SettlementState, Split,
};
use crate::core::money::{Currency, Money};
use crate::core::split_calculator::SplitCalculator;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::infrastructure::storage::{LedgerSnapshot, Storage};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything a member owes and is owed, one report per currency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserBalancesResponse {
    member: MemberId,
    reports: Vec<BalanceReport>,
}

impl UserBalancesResponse {
    pub fn member(&self) -> &MemberId {
        &self.member
    }

    /// Reports in ascending currency order; currencies with nothing
    /// outstanding are omitted.
    pub fn reports(&self) -> &[BalanceReport] {
        &self.reports
    }

    pub fn report(&self, currency: Currency) -> Option<&BalanceReport> {
        self.reports.iter().find(|r| r.currency == currency)
    }

    pub fn is_settled_up(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Balances of one member inside one group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupBalanceView {
    pub group_id: String,
    pub report: BalanceReport,
    /// Unsettled obligations across the whole group, whoever owes them.
    pub outstanding: Money,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecordedExpense {
    pub expense: Expense,
    pub splits: Vec<Split>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    pub split: Split,
    pub outcome: SettlementOutcome,
}

pub struct LedgerService<L: LoggingService, S: Storage, C: Cache> {
    storage: S,
    logging: L,
    cache: C,
    config: Config,
}

impl<L: LoggingService, S: Storage, C: Cache> LedgerService<L, S, C> {
    pub fn new(storage: S, logging: L, cache: C, config: Config) -> Self {
        LedgerService {
            storage,
            logging,
            cache,
            config,
        }
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    async fn validate_group_membership(&self, group_id: &str, member: &MemberId) -> Result<Group, LedgerError> {
        let group = self.load_group(group_id).await?;
        if !group.is_member(member) {
            warn!(group_id, member = %member, "member is not part of group");
            return Err(LedgerError::NotGroupMember(member.to_string()));
        }
        Ok(group)
    }

    async fn load_expense(&self, expense_id: &str) -> Result<Expense, LedgerError> {
        self.storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        log_details: serde_json::Value,
        member: Option<&MemberId>,
    ) -> Result<(), LedgerError> {
        self.logging.log_action(action, log_details.clone(), member).await?;
        if let Some(gid) = group_id {
            self.storage
                .save_group_audit(GroupAudit {
                    id: Uuid::new_v4().to_string(),
                    group_id: gid.to_string(),
                    action: action.to_string(),
                    member_id: member.cloned(),
                    details: serde_json::from_value(log_details)
                        .map_err(|e| LedgerError::LoggingError(format!("Failed to serialize audit details: {}", e)))?,
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }

    /// Drops cached balance views of everyone a write may have touched.
    async fn invalidate<'a, I>(&self, members: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = &'a MemberId>,
    {
        let members: Vec<MemberId> = members.into_iter().cloned().collect();
        debug!(count = members.len(), "invalidating cached balances");
        self.cache.invalidate_user_balances(&members).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("Invalid {}", field),
                    description: format!("{} cannot be empty", field),
                },
            ));
        }
        if value.chars().count() > max_length {
            return Err(LedgerError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("{} Too Long", field),
                    description: format!("{} cannot exceed {} characters", field, max_length),
                },
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(LedgerError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("Invalid {}", field),
                    description: format!("{} contains invalid characters", field),
                },
            ));
        }
        Ok(())
    }

    fn validate_optional_input(&self, field: &str, value: Option<&str>, max_length: usize) -> Result<(), LedgerError> {
        match value {
            Some(v) => self.validate_string_input(field, v, max_length),
            None => Ok(()),
        }
    }

    fn validate_expense_amount(&self, amount: Money, currency: Currency) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "expense amount must be greater than 0, got {}",
                amount.display(currency)
            )));
        }
        let max = self.config.max_expense(currency);
        if amount > max {
            return Err(LedgerError::InvalidAmount(format!(
                "expense amount cannot exceed {}",
                max.display(currency)
            )));
        }
        Ok(())
    }

    // GROUPS

    pub async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        currency: Option<Currency>,
        created_by: &MemberId,
    ) -> Result<Group, LedgerError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        self.validate_optional_input("description", description.as_deref(), MAX_NOTES_LENGTH)?;

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            created_by: created_by.clone(),
            currency: currency.unwrap_or(self.config.default_currency),
            members: BTreeSet::from([created_by.clone()]),
            created_at: now,
            updated_at: now,
        };
        self.storage.save_group(group.clone()).await?;
        info!(group_id = %group.id, created_by = %created_by, "group created");

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({ "group_id": group.id, "name": group.name, "currency": group.currency.code() }),
            Some(created_by),
        )
        .await?;

        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        self.storage.get_group(group_id).await
    }

    pub async fn member_groups(&self, member: &MemberId) -> Result<Vec<Group>, LedgerError> {
        let mut groups = self.storage.get_member_groups(member).await?;
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    pub async fn add_member(&self, group_id: &str, member: MemberId, added_by: &MemberId) -> Result<Group, LedgerError> {
        let mut group = self.validate_group_membership(group_id, added_by).await?;
        if group.is_member(&member) {
            return Err(LedgerError::AlreadyGroupMember(member.to_string()));
        }

        group.members.insert(member.clone());
        group.updated_at = Utc::now();
        self.storage.save_group(group.clone()).await?;
        info!(group_id, member = %member, "member added");

        self.log_and_audit(
            Some(group_id),
            MEMBER_ADDED,
            json!({ "group_id": group_id, "member_id": member.as_str() }),
            Some(added_by),
        )
        .await?;

        Ok(group)
    }

    /// Members may leave on their own; the group creator may remove anyone
    /// but themselves. Splits already recorded for the member stay in place.
    pub async fn remove_member(
        &self,
        group_id: &str,
        member: &MemberId,
        removed_by: &MemberId,
    ) -> Result<Group, LedgerError> {
        let mut group = self.validate_group_membership(group_id, removed_by).await?;
        if !group.is_member(member) {
            return Err(LedgerError::NotGroupMember(member.to_string()));
        }
        if group.is_creator(member) {
            return Err(LedgerError::InvalidGroupState(format!(
                "creator {} cannot leave group {}",
                member, group_id
            )));
        }
        if member != removed_by && !group.is_creator(removed_by) {
            return Err(LedgerError::NotCreator(removed_by.to_string()));
        }

        group.members.remove(member);
        group.updated_at = Utc::now();
        self.storage.save_group(group.clone()).await?;
        info!(group_id, member = %member, "member removed");

        self.log_and_audit(
            Some(group_id),
            MEMBER_REMOVED,
            json!({ "group_id": group_id, "member_id": member.as_str() }),
            Some(removed_by),
        )
        .await?;

        Ok(group)
    }

    /// Deletes the group with all of its expenses and splits. Creator only.
    pub async fn delete_group(&self, group_id: &str, deleted_by: &MemberId) -> Result<(), LedgerError> {
        let group = self.load_group(group_id).await?;
        if !group.is_creator(deleted_by) {
            return Err(LedgerError::NotCreator(deleted_by.to_string()));
        }

        let snapshot = self.storage.group_ledger_snapshot(group_id).await?;
        let mut affected: HashSet<MemberId> = group.members.iter().cloned().collect();
        affected.extend(parties(&snapshot));

        self.storage.delete_group(group_id).await?;
        self.invalidate(&affected).await?;
        info!(group_id, expenses = snapshot.expenses.len(), "group deleted");

        self.log_and_audit(
            Some(group_id),
            GROUP_DELETED,
            json!({ "group_id": group_id, "expenses_removed": snapshot.expenses.len() }),
            Some(deleted_by),
        )
        .await
    }

    // EXPENSES

    /// Records a group expense and its splits. All validation happens before
    /// anything is written; the expense and its splits are stored together.
    pub async fn add_expense(&self, new: NewExpense, created_by: &MemberId) -> Result<RecordedExpense, LedgerError> {
        let group = self.validate_group_membership(&new.group_id, created_by).await?;
        self.validate_string_input("name", &new.name, MAX_NAME_LENGTH)?;
        self.validate_optional_input("notes", new.notes.as_deref(), MAX_NOTES_LENGTH)?;
        if new.currency != group.currency {
            return Err(LedgerError::InvalidCurrency(format!(
                "group {} keeps its books in {}, expense is in {}",
                group.id, group.currency, new.currency
            )));
        }
        self.validate_expense_amount(new.amount, new.currency)?;

        let shares = SplitCalculator::compute_splits(new.amount, &new.payer, &group.members)?;

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group.id.clone(),
            name: new.name,
            notes: new.notes,
            payer: new.payer,
            amount: new.amount,
            currency: new.currency,
            date: new.date,
            created_by: created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        let splits: Vec<Split> = shares
            .into_iter()
            .map(|share| Split {
                id: Uuid::new_v4().to_string(),
                expense_id: expense.id.clone(),
                obligor: share.member,
                amount: share.amount,
                state: SettlementState::Unsettled,
                created_at: now,
            })
            .collect();

        self.storage
            .save_expense_with_splits(expense.clone(), splits.clone())
            .await?;
        self.invalidate(&group.members).await?;
        info!(
            expense_id = %expense.id,
            group_id = %group.id,
            amount = expense.amount.minor(),
            splits = splits.len(),
            "expense recorded"
        );

        self.log_and_audit(
            Some(&group.id),
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "group_id": group.id,
                "name": expense.name,
                "amount": expense.amount.minor(),
                "currency": expense.currency.code(),
                "payer_id": expense.payer.as_str(),
            }),
            Some(created_by),
        )
        .await?;

        Ok(RecordedExpense { expense, splits })
    }

    /// Edits name, notes or date. Creator only. Amounts never change here.
    pub async fn update_expense_details(
        &self,
        expense_id: &str,
        update: ExpenseDetailsUpdate,
        updated_by: &MemberId,
    ) -> Result<Expense, LedgerError> {
        let mut expense = self.load_expense(expense_id).await?;
        if expense.created_by != *updated_by {
            return Err(LedgerError::NotCreator(updated_by.to_string()));
        }

        if let Some(name) = update.name {
            self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
            expense.name = name;
        }
        if let Some(notes) = update.notes {
            self.validate_optional_input("notes", notes.as_deref(), MAX_NOTES_LENGTH)?;
            expense.notes = notes;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        expense.updated_at = Utc::now();
        self.storage.update_expense(expense.clone()).await?;

        self.log_and_audit(
            Some(&expense.group_id),
            EXPENSE_UPDATED,
            json!({ "expense_id": expense.id, "group_id": expense.group_id }),
            Some(updated_by),
        )
        .await?;

        Ok(expense)
    }

    /// Deletes an expense and its splits. Creator only.
    pub async fn delete_expense(&self, expense_id: &str, deleted_by: &MemberId) -> Result<(), LedgerError> {
        let expense = self.load_expense(expense_id).await?;
        if expense.created_by != *deleted_by {
            warn!(expense_id, member = %deleted_by, "delete attempted by non-creator");
            return Err(LedgerError::NotCreator(deleted_by.to_string()));
        }

        let splits = self.storage.get_expense_splits(expense_id).await?;
        self.storage.delete_expense(expense_id).await?;

        let affected: Vec<&MemberId> = std::iter::once(&expense.payer)
            .chain(splits.iter().map(|s| &s.obligor))
            .collect();
        self.invalidate(affected).await?;
        info!(expense_id, splits = splits.len(), "expense deleted");

        self.log_and_audit(
            Some(&expense.group_id),
            EXPENSE_DELETED,
            json!({ "expense_id": expense.id, "group_id": expense.group_id, "splits_removed": splits.len() }),
            Some(deleted_by),
        )
        .await
    }

    /// Expenses of a group, most recent date first.
    pub async fn group_expenses(&self, group_id: &str, queried_by: &MemberId) -> Result<Vec<Expense>, LedgerError> {
        self.validate_group_membership(group_id, queried_by).await?;
        let mut expenses = self.storage.get_group_expenses(group_id).await?;
        expenses.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(expenses)
    }

    pub async fn expense_splits(&self, expense_id: &str, queried_by: &MemberId) -> Result<Vec<Split>, LedgerError> {
        let expense = self.load_expense(expense_id).await?;
        self.validate_group_membership(&expense.group_id, queried_by).await?;
        self.storage.get_expense_splits(expense_id).await
    }

    // SETTLEMENT

    /// Marks a split as paid. Only the obligor or the payer may do so.
    ///
    /// Repeating the call on a settled split succeeds with
    /// [`SettlementOutcome::AlreadySettled`] and changes nothing, so a retry
    /// after a lost response is harmless.
    pub async fn mark_split_settled(&self, split_id: &str, settled_by: &MemberId) -> Result<SettlementResult, LedgerError> {
        let split = self
            .storage
            .get_split(split_id)
            .await?
            .ok_or_else(|| LedgerError::SplitNotFound(split_id.to_string()))?;
        let expense = self
            .storage
            .get_expense(&split.expense_id)
            .await?
            .ok_or_else(|| LedgerError::DanglingSplitReference {
                split_id: split.id.clone(),
                expense_id: split.expense_id.clone(),
            })?;
        if split.obligor != *settled_by && expense.payer != *settled_by {
            return Err(LedgerError::NotSplitParty(settled_by.to_string(), split_id.to_string()));
        }

        let (split, outcome) = self.storage.settle_split(split_id, Utc::now()).await?;
        if outcome == SettlementOutcome::AlreadySettled {
            debug!(split_id, "split already settled");
            return Ok(SettlementResult { split, outcome });
        }

        self.invalidate([&split.obligor, &expense.payer]).await?;
        info!(split_id, expense_id = %expense.id, "split settled");

        self.log_and_audit(
            Some(&expense.group_id),
            SPLIT_SETTLED,
            json!({
                "split_id": split.id,
                "expense_id": expense.id,
                "obligor_id": split.obligor.as_str(),
                "payer_id": expense.payer.as_str(),
                "amount": split.amount.minor(),
            }),
            Some(settled_by),
        )
        .await?;

        Ok(SettlementResult { split, outcome })
    }

    // BALANCES

    /// What the member owes and is owed across every group they ever took
    /// part in, recomputed from a fresh snapshot unless a valid cached view
    /// exists. A view is only cached if no write touched the member while it
    /// was being computed.
    pub async fn user_balances(&self, member: &MemberId) -> Result<UserBalancesResponse, LedgerError> {
        if let Some(cached) = self.cache.get_user_balances(member).await? {
            debug!(member = %member, "serving cached balances");
            return Ok(cached);
        }

        let generation = self.cache.user_balances_generation(member).await?;
        let snapshot = self.storage.member_ledger_snapshot(member).await?;
        let reports = reports_by_currency(member, &snapshot)?;
        let response = UserBalancesResponse {
            member: member.clone(),
            reports,
        };

        let cached = self
            .cache
            .save_user_balances(member, &response, self.config.balance_cache_ttl, generation)
            .await?;
        if !cached {
            debug!(member = %member, "ledger changed while computing balances; view not cached");
        }

        self.log_and_audit(
            None,
            BALANCE_QUERIED,
            json!({ "member_id": member.as_str(), "currencies": response.reports.len() }),
            Some(member),
        )
        .await?;

        Ok(response)
    }

    /// Balances of `member` restricted to one group's expenses.
    pub async fn group_balances(&self, group_id: &str, member: &MemberId) -> Result<GroupBalanceView, LedgerError> {
        let group = self.validate_group_membership(group_id, member).await?;
        let snapshot = self.storage.group_ledger_snapshot(group_id).await?;

        let balances = BalanceAggregator::compute_balances(member, &snapshot.splits, &snapshot.expenses)?;
        let totals = BalanceAggregator::compute_totals(&balances)?;

        Ok(GroupBalanceView {
            group_id: group.id,
            report: BalanceReport::new(group.currency, &balances, totals),
            outstanding: BalanceAggregator::outstanding(&snapshot.splits)?,
        })
    }

    // AUDIT

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        self.load_group(group_id).await?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }

    /// Actions `member` performed, newest first.
    pub async fn member_activity(&self, member: &MemberId) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_member_logs(member).await
    }
}

impl LedgerService<InMemoryLogging, InMemoryStorage, InMemoryCache> {
    /// A service backed entirely by in-memory stores, configured from the environment.
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryStorage::new(),
            InMemoryLogging::new(),
            InMemoryCache::new(),
            CONFIG.clone(),
        )
    }
}

/// Payers and obligors appearing in a snapshot.
fn parties(snapshot: &LedgerSnapshot) -> impl Iterator<Item = MemberId> + '_ {
    snapshot
        .expenses
        .iter()
        .map(|e| e.payer.clone())
        .chain(snapshot.splits.iter().map(|s| s.obligor.clone()))
}

/// Runs the aggregator once per currency so amounts in different currencies
/// are never added together.
fn reports_by_currency(member: &MemberId, snapshot: &LedgerSnapshot) -> Result<Vec<BalanceReport>, LedgerError> {
    let currency_of: std::collections::HashMap<&str, Currency> = snapshot
        .expenses
        .iter()
        .map(|e| (e.id.as_str(), e.currency))
        .collect();

    let mut splits_by_currency: BTreeMap<Currency, Vec<&Split>> = BTreeMap::new();
    for split in &snapshot.splits {
        let currency = currency_of
            .get(split.expense_id.as_str())
            .copied()
            .ok_or_else(|| LedgerError::DanglingSplitReference {
                split_id: split.id.clone(),
                expense_id: split.expense_id.clone(),
            })?;
        splits_by_currency.entry(currency).or_default().push(split);
    }

    let mut reports = Vec::new();
    for (currency, splits) in splits_by_currency {
        let balances = BalanceAggregator::compute_balances(member, splits, &snapshot.expenses)?;
        if balances.is_empty() {
            continue;
        }
        let totals = BalanceAggregator::compute_totals(&balances)?;
        reports.push(BalanceReport::new(currency, &balances, totals));
    }
    Ok(reports)
}
