pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::balance_aggregator::BalanceAggregator;
pub use crate::core::errors::LedgerError;
pub use crate::core::money::{Currency, Money};
pub use crate::core::services::LedgerService;
pub use crate::core::split_calculator::SplitCalculator;
pub use infrastructure::cache::in_memory::InMemoryCache;
pub use infrastructure::logging::in_memory::InMemoryLogging;
pub use infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
