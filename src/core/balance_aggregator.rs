use crate::core::errors::LedgerError;
use crate::core::models::{BalanceTotals, Balances, Expense, MemberId, Split};
use crate::core::money::Money;
use log::{debug, warn};
use std::collections::HashMap;

/// Folds split records into per-counterparty balances for one user.
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Net balance of `user` against every counterparty, from unsettled splits.
    ///
    /// Each split is joined to its expense by `expense_id` to find the payer.
    /// A split whose expense is absent fails the whole computation, whether
    /// or not it involves `user`: the payer cannot be known, so the split
    /// cannot be ruled out.
    ///
    /// Counterparties whose debts cancel out exactly are not listed.
    pub fn compute_balances<'a, S, E>(
        user: &MemberId,
        splits: S,
        expenses: E,
    ) -> Result<Balances, LedgerError>
    where
        S: IntoIterator<Item = &'a Split>,
        E: IntoIterator<Item = &'a Expense>,
    {
        let expenses_by_id: HashMap<&str, &Expense> =
            expenses.into_iter().map(|e| (e.id.as_str(), e)).collect();
        let mut balances = Balances::new();

        for split in splits {
            let expense = expenses_by_id
                .get(split.expense_id.as_str())
                .ok_or_else(|| {
                    warn!(
                        "Split {} references missing expense {}",
                        split.id, split.expense_id
                    );
                    LedgerError::DanglingSplitReference {
                        split_id: split.id.clone(),
                        expense_id: split.expense_id.clone(),
                    }
                })?;

            if split.is_settled() {
                continue;
            }
            if split.obligor == *user {
                balances.adjust(&expense.payer, -split.amount)?;
            }
            if expense.payer == *user {
                balances.adjust(&split.obligor, split.amount)?;
            }
        }

        balances.drop_zero_entries();
        debug!("Computed {} balance entries for {}", balances.len(), user);
        Ok(balances)
    }

    /// Splits a balance map into what others owe the user and what the user owes.
    pub fn compute_totals(balances: &Balances) -> Result<BalanceTotals, LedgerError> {
        balances
            .iter()
            .try_fold(BalanceTotals::default(), |mut totals, (_, amount)| {
                if amount.is_positive() {
                    totals.owed_to_user = totals.owed_to_user.checked_add(amount).ok_or_else(total_out_of_range)?;
                } else if amount.is_negative() {
                    totals.user_owes = totals.user_owes.checked_sub(amount).ok_or_else(total_out_of_range)?;
                }
                Ok(totals)
            })
    }

    /// Sum of all unsettled obligations in the given splits.
    pub fn outstanding(splits: &[Split]) -> Result<Money, LedgerError> {
        splits
            .iter()
            .filter(|s| !s.is_settled())
            .try_fold(Money::ZERO, |acc, s| acc.checked_add(s.amount).ok_or_else(total_out_of_range))
    }
}

fn total_out_of_range() -> LedgerError {
    LedgerError::InvalidAmount("balance total is out of range".to_string())
}
