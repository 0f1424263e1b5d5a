use crate::core::money::{Currency, Money};
use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Hard ceiling on a single expense in minor units. A million expenses at
/// the ceiling still sum within `i64`.
pub const EXPENSE_LIMIT_CEILING: Money = Money::from_minor(i64::MAX / 1_000_000);

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Currency for groups created without an explicit one.
    pub default_currency: Currency,
    pub balance_cache_ttl: Duration,
    /// Upper bound for a single expense, in major units.
    pub max_expense_amount: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_currency: Currency::default(),
            balance_cache_ttl: Duration::from_secs(300),
            max_expense_amount: 1_000_000,
        }
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            default_currency: env::var("DEFAULT_CURRENCY")
                .ok()
                .and_then(|v| Currency::try_from(v.as_str()).ok())
                .unwrap_or(defaults.default_currency),
            balance_cache_ttl: env::var("BALANCE_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.balance_cache_ttl),
            max_expense_amount: env::var("MAX_EXPENSE_AMOUNT")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_expense_amount),
        }
    }

    /// Largest accepted expense in minor units of `currency`, never above
    /// [`EXPENSE_LIMIT_CEILING`] whatever the configured amount.
    pub fn max_expense(&self, currency: Currency) -> Money {
        Money::from_major(self.max_expense_amount, currency)
            .filter(|limit| *limit <= EXPENSE_LIMIT_CEILING)
            .unwrap_or(EXPENSE_LIMIT_CEILING)
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
