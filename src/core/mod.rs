pub mod balance_aggregator;
pub mod errors;
pub mod models;
pub mod money;
pub mod services;
pub mod split_calculator;
