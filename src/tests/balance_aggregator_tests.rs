use super::{expense, member, split};
use crate::core::balance_aggregator::BalanceAggregator;
use crate::core::errors::LedgerError;
use crate::core::models::{BalanceTotals, Expense, Split};
use crate::core::money::Money;
use chrono::Utc;
use proptest::prelude::*;

fn settled(mut s: Split) -> Split {
    s.mark_settled(Utc::now());
    s
}

#[test]
fn test_opposite_debts_net_per_counterparty() {
    // alice owes bob 300, bob owes alice 100
    let expenses = vec![expense("e1", "bob", 600), expense("e2", "alice", 200)];
    let splits = vec![split("s1", "e1", "alice", 300), split("s2", "e2", "bob", 100)];

    let alice = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    let bob = BalanceAggregator::compute_balances(&member("bob"), &splits, &expenses).unwrap();

    assert_eq!(alice.get(&member("bob")), Money::from_minor(-200));
    assert_eq!(bob.get(&member("alice")), Money::from_minor(200));
}

#[test]
fn test_breakdown_is_ordered_by_counterparty() {
    let expenses = vec![expense("e1", "alice", 900)];
    let splits = vec![
        split("s3", "e1", "zoe", 300),
        split("s1", "e1", "bob", 300),
        split("s2", "e1", "carol", 300),
    ];

    let balances = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    let order: Vec<&str> = balances.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(order, vec!["bob", "carol", "zoe"]);
}

#[test]
fn test_settled_splits_carry_no_weight() {
    let expenses = vec![expense("e1", "alice", 900)];
    let splits = vec![settled(split("s1", "e1", "bob", 300)), split("s2", "e1", "carol", 300)];

    let balances = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances.get(&member("bob")), Money::ZERO);
    assert_eq!(balances.get(&member("carol")), Money::from_minor(300));
}

#[test]
fn test_fully_settled_user_has_no_balances() {
    let expenses = vec![expense("e1", "alice", 900), expense("e2", "bob", 400)];
    let splits = vec![
        settled(split("s1", "e1", "bob", 300)),
        settled(split("s2", "e1", "carol", 300)),
        settled(split("s3", "e2", "alice", 200)),
    ];

    let balances = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    assert!(balances.is_empty());
    assert_eq!(BalanceAggregator::compute_totals(&balances).unwrap(), BalanceTotals::default());
}

#[test]
fn test_totals_are_not_netted() {
    let expenses = vec![expense("e1", "alice", 900), expense("e2", "dave", 1000)];
    let splits = vec![
        split("s1", "e1", "bob", 300),
        split("s2", "e1", "carol", 300),
        split("s3", "e2", "alice", 500),
    ];

    let balances = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    let totals = BalanceAggregator::compute_totals(&balances).unwrap();
    assert_eq!(totals.owed_to_user, Money::from_minor(600));
    assert_eq!(totals.user_owes, Money::from_minor(500));
}

#[test]
fn test_split_with_missing_expense_is_reported() {
    let expenses = vec![expense("e1", "alice", 900)];
    let splits = vec![split("s1", "e1", "bob", 300), split("s9", "gone", "carol", 50)];

    let result = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses);
    assert_eq!(
        result,
        Err(LedgerError::DanglingSplitReference {
            split_id: "s9".to_string(),
            expense_id: "gone".to_string(),
        })
    );
}

#[test]
fn test_splits_of_unrelated_members_are_ignored() {
    let expenses = vec![expense("e1", "bob", 900)];
    let splits = vec![split("s1", "e1", "carol", 300), split("s2", "e1", "dave", 300)];

    let balances = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    assert!(balances.is_empty());
}

#[test]
fn test_outstanding_counts_only_unsettled() {
    let splits = vec![settled(split("s1", "e1", "bob", 300)), split("s2", "e1", "carol", 250)];
    assert_eq!(BalanceAggregator::outstanding(&splits).unwrap(), Money::from_minor(250));
}

#[test]
fn test_balance_beyond_i64_is_an_error() {
    let near_max = i64::MAX - 1;
    let expenses = vec![expense("e1", "alice", near_max), expense("e2", "alice", near_max)];
    let splits = vec![split("s1", "e1", "bob", near_max), split("s2", "e2", "bob", near_max)];

    let result = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses);
    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
}

#[test]
fn test_totals_beyond_i64_are_an_error() {
    let large = i64::MAX - 10;
    let expenses = vec![expense("e1", "alice", large), expense("e2", "alice", large)];
    let splits = vec![split("s1", "e1", "bob", large), split("s2", "e2", "carol", large)];

    let balances = BalanceAggregator::compute_balances(&member("alice"), &splits, &expenses).unwrap();
    assert!(matches!(
        BalanceAggregator::compute_totals(&balances),
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        BalanceAggregator::outstanding(&splits),
        Err(LedgerError::InvalidAmount(_))
    ));
}

const PEOPLE: [&str; 4] = ["ann", "ben", "cat", "dan"];

fn ledger() -> impl Strategy<Value = (Vec<Expense>, Vec<Split>)> {
    prop::collection::vec((0usize..4, 0usize..4, 1i64..10_000, any::<bool>()), 0..25).prop_map(|rows| {
        let mut expenses = Vec::new();
        let mut splits = Vec::new();
        for (idx, (payer, obligor, minor, is_settled)) in rows.into_iter().enumerate() {
            if payer == obligor {
                continue;
            }
            let expense_id = format!("e{idx}");
            expenses.push(expense(&expense_id, PEOPLE[payer], minor * 2));
            let s = split(&format!("s{idx}"), &expense_id, PEOPLE[obligor], minor);
            splits.push(if is_settled { settled(s) } else { s });
        }
        (expenses, splits)
    })
}

proptest! {
    #[test]
    fn balances_are_antisymmetric((expenses, splits) in ledger(), a in 0usize..4, b in 0usize..4) {
        let (a, b) = (member(PEOPLE[a]), member(PEOPLE[b]));
        let from_a = BalanceAggregator::compute_balances(&a, &splits, &expenses).unwrap();
        let from_b = BalanceAggregator::compute_balances(&b, &splits, &expenses).unwrap();
        if a != b {
            prop_assert_eq!(from_a.get(&b), -from_b.get(&a));
        }
    }

    #[test]
    fn settling_everything_clears_balances((expenses, splits) in ledger(), who in 0usize..4) {
        let splits: Vec<Split> = splits.into_iter().map(settled).collect();
        let balances = BalanceAggregator::compute_balances(&member(PEOPLE[who]), &splits, &expenses).unwrap();
        prop_assert!(balances.is_empty());
    }

    #[test]
    fn input_order_does_not_change_output((expenses, splits) in ledger(), who in 0usize..4) {
        let user = member(PEOPLE[who]);
        let forward = BalanceAggregator::compute_balances(&user, &splits, &expenses).unwrap();
        let reversed = BalanceAggregator::compute_balances(&user, splits.iter().rev(), expenses.iter().rev()).unwrap();
        prop_assert_eq!(forward, reversed);
    }
}
