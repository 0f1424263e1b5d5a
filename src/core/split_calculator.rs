//! Equal-share attribution of a group expense.
//!
//! The amount is floor-divided by the member count in minor units. The
//! leftover units (always fewer than the member count) go one each to the
//! members with the lowest identifiers, payer included, so the shares add
//! back up to exactly the expense amount.

use crate::core::errors::LedgerError;
use crate::core::models::{MemberId, MemberShare};
use crate::core::money::Money;
use log::debug;
use std::collections::BTreeSet;

pub struct SplitCalculator;

impl SplitCalculator {
    /// Shares owed to `payer` by every other member, in ascending member order.
    ///
    /// The payer's own share is absorbed and not returned; see
    /// [`SplitCalculator::payer_share`].
    pub fn compute_splits(
        amount: Money,
        payer: &MemberId,
        members: &BTreeSet<MemberId>,
    ) -> Result<Vec<MemberShare>, LedgerError> {
        let shares = Self::equal_shares(amount, payer, members)?;
        let splits: Vec<MemberShare> = shares
            .into_iter()
            .filter(|share| share.member != *payer)
            .collect();
        debug!(
            "Split {} paid by {} into {} obligations",
            amount,
            payer,
            splits.len()
        );
        Ok(splits)
    }

    /// The part of `amount` the payer carries themselves.
    pub fn payer_share(
        amount: Money,
        payer: &MemberId,
        members: &BTreeSet<MemberId>,
    ) -> Result<Money, LedgerError> {
        Self::equal_shares(amount, payer, members)?
            .into_iter()
            .find(|share| share.member == *payer)
            .map(|share| share.amount)
            .ok_or_else(|| LedgerError::InvalidGroupState(format!("payer {payer} is not a group member")))
    }

    /// Every member's share, payer included, in ascending member order.
    pub fn equal_shares(
        amount: Money,
        payer: &MemberId,
        members: &BTreeSet<MemberId>,
    ) -> Result<Vec<MemberShare>, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "expense amount must be greater than 0, got {amount}"
            )));
        }
        if members.is_empty() {
            return Err(LedgerError::InvalidGroupState("group has no members".to_string()));
        }
        if !members.contains(payer) {
            return Err(LedgerError::InvalidGroupState(format!(
                "payer {payer} is not a group member"
            )));
        }

        let count = members.len() as i64;
        let total = amount.minor();
        // Every split must be a positive obligation.
        if total < count {
            return Err(LedgerError::InvalidAmount(format!(
                "{total} minor units cannot be split among {count} members"
            )));
        }

        let base = total / count;
        let leftover = (total % count) as usize;

        Ok(members
            .iter()
            .enumerate()
            .map(|(idx, member)| MemberShare {
                member: member.clone(),
                amount: Money::from_minor(if idx < leftover { base + 1 } else { base }),
            })
            .collect())
    }
}
