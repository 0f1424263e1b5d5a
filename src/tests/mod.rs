mod balance_aggregator_tests;
mod group_tests;

use crate::config::Config;
use crate::core::models::{Expense, MemberId, SettlementState, Split};
use crate::core::money::{Currency, Money};
use crate::core::services::LedgerService;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::BTreeSet;

pub type TestService = LedgerService<InMemoryLogging, InMemoryStorage, InMemoryCache>;

pub fn create_test_service() -> TestService {
    create_test_service_with(InMemoryStorage::new(), Config::default())
}

pub fn create_test_service_with<S: Storage>(storage: S, config: Config) -> LedgerService<InMemoryLogging, S, InMemoryCache> {
    let _ = env_logger::try_init();
    let logging = InMemoryLogging::new();
    let cache = InMemoryCache::new();
    LedgerService::new(storage, logging, cache, config)
}

pub fn member(id: &str) -> MemberId {
    MemberId::from(id)
}

pub fn members(ids: &[&str]) -> BTreeSet<MemberId> {
    ids.iter().map(|id| member(id)).collect()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn expense(id: &str, payer: &str, minor: i64) -> Expense {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    Expense {
        id: id.to_string(),
        group_id: "g1".to_string(),
        name: format!("expense {id}"),
        notes: None,
        payer: member(payer),
        amount: Money::from_minor(minor),
        currency: Currency::Inr,
        date: date(2025, 1, 1),
        created_by: member(payer),
        created_at: at,
        updated_at: at,
    }
}

pub fn split(id: &str, expense_id: &str, obligor: &str, minor: i64) -> Split {
    Split {
        id: id.to_string(),
        expense_id: expense_id.to_string(),
        obligor: member(obligor),
        amount: Money::from_minor(minor),
        state: SettlementState::Unsettled,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    }
}
