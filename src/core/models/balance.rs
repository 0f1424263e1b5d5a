use super::member::MemberId;
use crate::core::errors::LedgerError;
use crate::core::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net position of one user against each counterparty.
///
/// Positive entries mean the counterparty owes the user; negative entries
/// mean the user owes the counterparty. Iteration is in ascending
/// counterparty order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<MemberId, Money>);

impl Balances {
    pub fn new() -> Self {
        Balances(BTreeMap::new())
    }

    pub fn get(&self, counterparty: &MemberId) -> Money {
        self.0.get(counterparty).copied().unwrap_or(Money::ZERO)
    }

    /// Adds `delta` to the entry for `counterparty`. Fails with
    /// `InvalidAmount` if the entry would leave the `i64` range.
    pub fn adjust(&mut self, counterparty: &MemberId, delta: Money) -> Result<(), LedgerError> {
        let entry = self.0.entry(counterparty.clone()).or_insert(Money::ZERO);
        *entry = entry.checked_add(delta).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("balance with {counterparty} is out of range"))
        })?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, Money)> + '_ {
        self.0.iter().map(|(member, amount)| (member, *amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn drop_zero_entries(&mut self) {
        self.0.retain(|_, amount| !amount.is_zero());
    }
}

/// "You are owed" and "you owe", kept apart as two non-negative sums.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub owed_to_user: Money,
    pub user_owes: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub counterparty: MemberId,
    pub amount: Money,
}

/// Balances of one user in one currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub currency: Currency,
    pub entries: Vec<BalanceEntry>,
    pub totals: BalanceTotals,
}

impl BalanceReport {
    pub fn new(currency: Currency, balances: &Balances, totals: BalanceTotals) -> Self {
        BalanceReport {
            currency,
            entries: balances
                .iter()
                .map(|(counterparty, amount)| BalanceEntry {
                    counterparty: counterparty.clone(),
                    amount,
                })
                .collect(),
            totals,
        }
    }

    pub fn balance_with(&self, counterparty: &MemberId) -> Money {
        self.entries
            .iter()
            .find(|e| e.counterparty == *counterparty)
            .map(|e| e.amount)
            .unwrap_or(Money::ZERO)
    }
}
